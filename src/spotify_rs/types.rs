use serde::{Deserialize, Serialize};

/// Spotify OAuth token response
///
/// Every field is optional so that a well-formed body without a token is
/// reported as a missing token rather than a decode failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTokenResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
    pub scope: Option<String>,
}

/// Response of `GET /search?type=track`
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifySearchResponse {
    #[serde(default)]
    pub tracks: SpotifyTrackPage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpotifyTrackPage {
    #[serde(default)]
    pub items: Vec<SpotifySearchTrack>,
}

/// Track item of a search result page
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifySearchTrack {
    pub name: String,
    pub uri: String,
}

/// Spotify playlist from API
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyPlaylist {
    pub name: String,
}

/// Body of `PUT /playlists/{id}/tracks`
#[derive(Debug, Clone, Serialize)]
pub struct ReplacePlaylistTracksRequest<'a> {
    pub uris: &'a [String],
}
