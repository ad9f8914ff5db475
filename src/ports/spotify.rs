use std::fmt;

use crate::spotify_rs::client::SpotifyApiError;

/// Decoupled representation of a Spotify track returned by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyApiTrack {
    pub name: String,
    pub uri: String,
}

/// Decoupled representation of a Spotify playlist from the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyApiPlaylist {
    pub name: String,
}

/// Credentials for the refresh-token grant.
#[derive(Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Bearer credential for one sync run. Never refreshed mid-run.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticatedSession {
    access_token: String,
}

impl AuthenticatedSession {
    pub fn new(access_token: String) -> Self {
        Self { access_token }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for AuthenticatedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedSession")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Outcome of a login attempt against the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Authenticated(AuthenticatedSession),
    Unauthenticated { reason: String },
}

/// Port trait wrapping the Spotify API capabilities used by business logic.
///
/// Implementations live in `services::spotify::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SpotifyClient: Send + Sync {
    /// Login failures are reported as [`Session::Unauthenticated`], never as an error.
    async fn authenticate(&self, credentials: &SpotifyCredentials) -> Session;

    async fn search_tracks(
        &self,
        session: &AuthenticatedSession,
        query: &str,
    ) -> Result<Vec<SpotifyApiTrack>, SpotifyApiError>;

    /// Overwrites the whole track list of the playlist with `uris`, in order.
    async fn replace_playlist_tracks(
        &self,
        session: &AuthenticatedSession,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), SpotifyApiError>;

    async fn playlist(
        &self,
        session: &AuthenticatedSession,
        playlist_id: &str,
    ) -> Result<SpotifyApiPlaylist, SpotifyApiError>;
}
