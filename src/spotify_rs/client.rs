use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response};
use url::Url;

use crate::spotify_rs::types::{
    ReplacePlaylistTracksRequest, SpotifyPlaylist, SpotifySearchResponse, SpotifySearchTrack,
};

pub const SPOTIFY_API_BASE_URL: &str = "https://api.spotify.com/v1/";

#[derive(Debug, thiserror::Error)]
pub enum SpotifyApiError {
    #[error("Invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
    #[error("Unexpected response status {status}: {reason}")]
    UnexpectedStatus { status: u16, reason: String },
}

/// Spotify Web API client.
///
/// Holds no credentials; every call is made with the access token it is given.
pub struct SpotifyClient {
    client: reqwest::Client,
    api_base: Url,
}

impl SpotifyClient {
    pub fn new(client: reqwest::Client, api_base: Url) -> Self {
        Self { client, api_base }
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        access_token: &str,
    ) -> Result<RequestBuilder, SpotifyApiError> {
        let url = self.api_base.join(path)?;
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(access_token)
            .header(CONTENT_TYPE, "application/json"))
    }

    pub fn search_tracks_request(
        &self,
        access_token: &str,
        query: &str,
    ) -> Result<RequestBuilder, SpotifyApiError> {
        Ok(self
            .request(Method::GET, "search", access_token)?
            .query(&[("type", "track"), ("q", query)]))
    }

    pub fn replace_playlist_tracks_request(
        &self,
        access_token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<RequestBuilder, SpotifyApiError> {
        let path = format!("playlists/{}/tracks", urlencoding::encode(playlist_id));
        Ok(self
            .request(Method::PUT, &path, access_token)?
            .json(&ReplacePlaylistTracksRequest { uris }))
    }

    pub fn playlist_request(
        &self,
        access_token: &str,
        playlist_id: &str,
    ) -> Result<RequestBuilder, SpotifyApiError> {
        let path = format!("playlists/{}", urlencoding::encode(playlist_id));
        self.request(Method::GET, &path, access_token)
    }

    /// Search the catalog for tracks matching a free-text query.
    pub async fn search_tracks(
        &self,
        access_token: &str,
        query: &str,
    ) -> Result<Vec<SpotifySearchTrack>, SpotifyApiError> {
        let response = send(self.search_tracks_request(access_token, query)?).await?;

        let page: SpotifySearchResponse = response
            .json()
            .await
            .map_err(SpotifyApiError::FailedToParseResponse)?;

        Ok(page.tracks.items)
    }

    /// Replace every track of a playlist.
    pub async fn replace_playlist_tracks(
        &self,
        access_token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), SpotifyApiError> {
        send(self.replace_playlist_tracks_request(access_token, playlist_id, uris)?).await?;
        Ok(())
    }

    pub async fn get_playlist(
        &self,
        access_token: &str,
        playlist_id: &str,
    ) -> Result<SpotifyPlaylist, SpotifyApiError> {
        let response = send(self.playlist_request(access_token, playlist_id)?).await?;

        response
            .json()
            .await
            .map_err(SpotifyApiError::FailedToParseResponse)
    }
}

/// Sends the request and turns any status outside 2xx into an error.
async fn send(request: RequestBuilder) -> Result<Response, SpotifyApiError> {
    let response = request
        .send()
        .await
        .map_err(SpotifyApiError::FailedToSendRequest)?;

    let status = response.status();
    if !status.is_success() {
        return Err(SpotifyApiError::UnexpectedStatus {
            status: status.as_u16(),
            reason: response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string()),
        });
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use reqwest::header::AUTHORIZATION;

    fn client() -> SpotifyClient {
        SpotifyClient::new(
            reqwest::Client::new(),
            Url::parse(SPOTIFY_API_BASE_URL).unwrap(),
        )
    }

    fn client_for(server: &Server) -> SpotifyClient {
        SpotifyClient::new(
            reqwest::Client::new(),
            Url::parse(&format!("{}/v1/", server.url())).unwrap(),
        )
    }

    #[test]
    fn test_search_tracks_request() {
        let request = client()
            .search_tracks_request("token", "Song A Artist A")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(
            request.url().as_str(),
            "https://api.spotify.com/v1/search?type=track&q=Song+A+Artist+A"
        );
        assert_eq!(request.headers().get(AUTHORIZATION).unwrap(), "Bearer token");
        assert_eq!(
            request.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_search_tracks_request_escapes_query() {
        let request = client()
            .search_tracks_request("token", "Rock & Roll AC/DC")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            request.url().query(),
            Some("type=track&q=Rock+%26+Roll+AC%2FDC")
        );
    }

    #[test]
    fn test_replace_playlist_tracks_request() {
        let uris = vec!["spotify:track:1".to_string(), "spotify:track:2".to_string()];
        let request = client()
            .replace_playlist_tracks_request("token", "37i9dQZF1DXcBWIGoYBM5M", &uris)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.method(), Method::PUT);
        assert_eq!(
            request.url().as_str(),
            "https://api.spotify.com/v1/playlists/37i9dQZF1DXcBWIGoYBM5M/tracks"
        );
        assert_eq!(request.headers().get(AUTHORIZATION).unwrap(), "Bearer token");
        assert_eq!(
            request.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let body = request.body().and_then(|body| body.as_bytes()).unwrap();
        assert_eq!(
            std::str::from_utf8(body).unwrap(),
            r#"{"uris":["spotify:track:1","spotify:track:2"]}"#
        );
    }

    #[test]
    fn test_replace_playlist_tracks_request_with_no_uris() {
        let request = client()
            .replace_playlist_tracks_request("token", "pl", &[])
            .unwrap()
            .build()
            .unwrap();

        let body = request.body().and_then(|body| body.as_bytes()).unwrap();
        assert_eq!(std::str::from_utf8(body).unwrap(), r#"{"uris":[]}"#);
    }

    #[test]
    fn test_playlist_request_encodes_id() {
        let request = client()
            .playlist_request("token", "a b/c")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://api.spotify.com/v1/playlists/a%20b%2Fc"
        );
    }

    #[tokio::test]
    async fn test_search_tracks_keeps_api_order() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex("^/v1/search".into()))
            .match_header("authorization", "Bearer token")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("type".into(), "track".into()),
                Matcher::UrlEncoded("q".into(), "Song A Artist A".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"tracks":{"items":[
                    {"name":"Song A","uri":"spotify:track:1"},
                    {"name":"Song A (Live)","uri":"spotify:track:2"}
                ]}}"#,
            )
            .create_async()
            .await;

        let items = client_for(&server)
            .search_tracks("token", "Song A Artist A")
            .await
            .unwrap();

        let uris: Vec<_> = items.iter().map(|item| item.uri.as_str()).collect();
        assert_eq!(uris, vec!["spotify:track:1", "spotify:track:2"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_tracks_unauthorized() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Regex("^/v1/search".into()))
            .with_status(401)
            .with_body(r#"{"error":{"status":401,"message":"The access token expired"}}"#)
            .create_async()
            .await;

        let result = client_for(&server).search_tracks("expired", "Song A").await;

        match result {
            Err(SpotifyApiError::UnexpectedStatus { status, reason }) => {
                assert_eq!(status, 401);
                assert!(reason.contains("access token expired"));
            }
            other => panic!("expected UnexpectedStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_replace_playlist_tracks_forbidden() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/v1/playlists/pl1/tracks")
            .match_body(Matcher::Json(serde_json::json!({
                "uris": ["spotify:track:1"]
            })))
            .with_status(403)
            .with_body(r#"{"error":{"status":403,"message":"Forbidden"}}"#)
            .create_async()
            .await;

        let result = client_for(&server)
            .replace_playlist_tracks("token", "pl1", &["spotify:track:1".to_string()])
            .await;

        assert!(matches!(
            result,
            Err(SpotifyApiError::UnexpectedStatus { status: 403, .. })
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_replace_playlist_tracks_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/v1/playlists/pl1/tracks")
            .with_status(201)
            .with_body(r#"{"snapshot_id":"abc"}"#)
            .create_async()
            .await;

        client_for(&server)
            .replace_playlist_tracks("token", "pl1", &[])
            .await
            .unwrap();
        mock.assert_async().await;
    }
}
