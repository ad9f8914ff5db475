use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use url::Url;

use crate::ports::spotify::{
    AuthenticatedSession, Session, SpotifyApiPlaylist, SpotifyApiTrack, SpotifyClient,
    SpotifyCredentials,
};
use crate::spotify_rs::auth::{RefreshTokenError, SPOTIFY_TOKEN_URL, refresh_access_token};
use crate::spotify_rs::client::{SPOTIFY_API_BASE_URL, SpotifyApiError, SpotifyClient as SpotifyApi};

pub struct SpotifyHttpAdapter {
    client: reqwest::Client,
    api: SpotifyApi,
    token_url: String,
}

impl SpotifyHttpAdapter {
    /// `timeout` bounds every request; `None` keeps the transport default.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        Self::with_endpoints(timeout, SPOTIFY_API_BASE_URL, SPOTIFY_TOKEN_URL)
    }

    /// Adapter talking to the given API base (with trailing slash) and token endpoint.
    pub fn with_endpoints(
        timeout: Option<Duration>,
        api_base: &str,
        token_url: &str,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().wrap_err("Failed to build http client")?;

        let api_base = Url::parse(api_base)
            .wrap_err_with(|| format!("Invalid Spotify API url: {}", api_base))?;

        Ok(Self {
            api: SpotifyApi::new(client.clone(), api_base),
            client,
            token_url: token_url.to_string(),
        })
    }
}

fn session_from_refresh(result: Result<String, RefreshTokenError>) -> Session {
    match result {
        Ok(access_token) => Session::Authenticated(AuthenticatedSession::new(access_token)),
        Err(error) => {
            log::warn!("Spotify refresh-token exchange failed: {}", error);
            Session::Unauthenticated {
                reason: error.to_string(),
            }
        }
    }
}

#[async_trait::async_trait]
impl SpotifyClient for SpotifyHttpAdapter {
    async fn authenticate(&self, credentials: &SpotifyCredentials) -> Session {
        log::debug!(
            "Requesting Spotify access token for client id: {}",
            credentials.client_id
        );
        session_from_refresh(
            refresh_access_token(
                &self.client,
                &self.token_url,
                &credentials.client_id,
                &credentials.client_secret,
                &credentials.refresh_token,
            )
            .await,
        )
    }

    async fn search_tracks(
        &self,
        session: &AuthenticatedSession,
        query: &str,
    ) -> Result<Vec<SpotifyApiTrack>, SpotifyApiError> {
        let items = self
            .api
            .search_tracks(session.access_token(), query)
            .await?;

        Ok(items
            .into_iter()
            .map(|item| SpotifyApiTrack {
                name: item.name,
                uri: item.uri,
            })
            .collect())
    }

    async fn replace_playlist_tracks(
        &self,
        session: &AuthenticatedSession,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), SpotifyApiError> {
        self.api
            .replace_playlist_tracks(session.access_token(), playlist_id, uris)
            .await
    }

    async fn playlist(
        &self,
        session: &AuthenticatedSession,
        playlist_id: &str,
    ) -> Result<SpotifyApiPlaylist, SpotifyApiError> {
        let playlist = self
            .api
            .get_playlist(session.access_token(), playlist_id)
            .await?;

        Ok(SpotifyApiPlaylist {
            name: playlist.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server, ServerGuard};

    use super::*;
    use crate::services::resolver::{ResolveError, TrackResolver};
    use crate::services::sync::{PlaylistSynchronizer, SyncError, SyncOptions, SyncState};
    use crate::test_utils::playlist_page;
    use crate::track::Track;

    fn adapter_for(server: &ServerGuard) -> SpotifyHttpAdapter {
        SpotifyHttpAdapter::with_endpoints(
            None,
            &format!("{}/v1/", server.url()),
            &format!("{}/api/token", server.url()),
        )
        .unwrap()
    }

    fn credentials() -> SpotifyCredentials {
        SpotifyCredentials {
            client_id: "id".into(),
            client_secret: "secret".into(),
            refresh_token: "rt".into(),
        }
    }

    async fn mock_login(server: &mut ServerGuard) -> mockito::Mock {
        server
            .mock("POST", "/api/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"at","token_type":"Bearer","expires_in":3600}"#)
            .create_async()
            .await
    }

    #[test]
    fn test_session_from_refresh_success() {
        let session = session_from_refresh(Ok("at".to_string()));
        assert_eq!(
            session,
            Session::Authenticated(AuthenticatedSession::new("at".to_string()))
        );
    }

    #[test]
    fn test_session_from_refresh_rejected() {
        let session = session_from_refresh(Err(RefreshTokenError::InvalidRefreshToken {
            status: 400,
            reason: r#"{"error":"invalid_grant"}"#.to_string(),
        }));

        match session {
            Session::Unauthenticated { reason } => {
                assert!(reason.contains("400"));
                assert!(reason.contains("invalid_grant"));
            }
            Session::Authenticated(_) => panic!("expected an unauthenticated session"),
        }
    }

    #[test]
    fn test_session_from_refresh_missing_token() {
        let session = session_from_refresh(Err(RefreshTokenError::MissingAccessToken));
        assert!(matches!(session, Session::Unauthenticated { .. }));
    }

    #[test]
    fn test_new_adapter_targets_spotify() {
        let adapter = SpotifyHttpAdapter::new(Some(Duration::from_secs(5))).unwrap();
        assert_eq!(adapter.token_url, SPOTIFY_TOKEN_URL);
    }

    #[tokio::test]
    async fn test_authenticate_rejected_refresh_token() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/token")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let session = adapter_for(&server).authenticate(&credentials()).await;

        match session {
            Session::Unauthenticated { reason } => {
                assert!(reason.contains("400"));
                assert!(reason.contains("invalid_grant"));
            }
            Session::Authenticated(_) => panic!("expected an unauthenticated session"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_without_access_token() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"token_type":"Bearer"}"#)
            .create_async()
            .await;

        let session = adapter_for(&server).authenticate(&credentials()).await;

        assert!(matches!(session, Session::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let mut server = Server::new_async().await;
        let login = mock_login(&mut server).await;

        let session = adapter_for(&server).authenticate(&credentials()).await;

        assert_eq!(
            session,
            Session::Authenticated(AuthenticatedSession::new("at".to_string()))
        );
        login.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_search_is_request_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Regex("^/v1/search".into()))
            .with_status(401)
            .with_body(r#"{"error":{"status":401,"message":"Invalid access token"}}"#)
            .create_async()
            .await;

        let adapter = adapter_for(&server);
        let session = AuthenticatedSession::new("expired".to_string());
        let resolver = TrackResolver::new(&adapter, &session);
        let result = resolver.search_track(&Track::new("Song A", "Artist A")).await;

        match result {
            Err(ResolveError::Request { track, source }) => {
                assert_eq!(track, Track::new("Song A", "Artist A"));
                assert!(matches!(
                    source,
                    SpotifyApiError::UnexpectedStatus { status: 401, .. }
                ));
            }
            other => panic!("expected Request error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_forbidden_update_is_rejected_with_status() {
        let mut server = Server::new_async().await;
        mock_login(&mut server).await;
        server
            .mock("GET", Matcher::Regex("^/v1/search".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"tracks":{"items":[{"name":"Song A","uri":"spotify:track:1"}]}}"#)
            .create_async()
            .await;
        let update = server
            .mock("PUT", "/v1/playlists/pl1/tracks")
            .match_header("authorization", "Bearer at")
            .with_status(403)
            .with_body(r#"{"error":{"status":403,"message":"Forbidden"}}"#)
            .expect(1)
            .create_async()
            .await;

        let adapter = adapter_for(&server);
        let page = playlist_page(&[("Song A", Some("Artist A"))]);
        let mut synchronizer = PlaylistSynchronizer::new(
            &adapter,
            credentials(),
            SyncOptions {
                playlist_id: "pl1".into(),
                dry_run: false,
            },
        );
        let result = synchronizer.run(&page).await;

        match result {
            Err(error @ SyncError::UpdateRejected { status: 403, .. }) => {
                assert!(error.to_string().contains("403"));
            }
            other => panic!("expected UpdateRejected, got {:?}", other),
        }
        assert_eq!(synchronizer.state(), SyncState::Failed);
        update.assert_async().await;
    }
}
