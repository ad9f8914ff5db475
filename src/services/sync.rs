use crate::ports::page::RenderedPage;
use crate::ports::spotify::{Session, SpotifyClient, SpotifyCredentials};
use crate::services::extractor::{ExtractionError, extract_tracks};
use crate::services::resolver::{ResolveError, TrackResolver};
use crate::spotify_rs::client::SpotifyApiError;
use crate::track::{ResolvedTrack, Track};

/// Stage of a sync run.
///
/// `Failed` can be reached from every state after `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Authenticating,
    Extracting,
    Resolving,
    Updating,
    Done,
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Spotify login failed: {reason}")]
    Authentication { reason: String },
    #[error("Failed to extract tracks from the source page")]
    Extraction(#[from] ExtractionError),
    #[error("[SPOTIFY] Failed to match track: {track}")]
    NoMatchFound { track: Track },
    #[error("[SPOTIFY] Search request failed for track: {track}")]
    Request {
        track: Track,
        source: SpotifyApiError,
    },
    #[error("[SPOTIFY] Playlist update rejected with status {status}: {reason}")]
    UpdateRejected { status: u16, reason: String },
    #[error("[SPOTIFY] Playlist update failed")]
    UpdateFailed { source: SpotifyApiError },
}

impl From<ResolveError> for SyncError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::NoMatchFound { track } => SyncError::NoMatchFound { track },
            ResolveError::Request { track, source } => SyncError::Request { track, source },
        }
    }
}

impl From<SpotifyApiError> for SyncError {
    fn from(error: SpotifyApiError) -> Self {
        match error {
            SpotifyApiError::UnexpectedStatus { status, reason } => {
                SyncError::UpdateRejected { status, reason }
            }
            source => SyncError::UpdateFailed { source },
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub playlist_id: String,
    /// Resolve every track but leave the playlist untouched.
    pub dry_run: bool,
}

/// Result of a successful sync run
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub playlist_id: String,
    /// Source tracks with their matches, in playlist order.
    pub tracks: Vec<(Track, ResolvedTrack)>,
    /// Whether the playlist was overwritten (false for dry runs).
    pub updated: bool,
}

impl SyncReport {
    pub fn uris(&self) -> Vec<String> {
        self.tracks
            .iter()
            .map(|(_, resolved)| resolved.uri.clone())
            .collect()
    }
}

/// Mirrors a rendered source playlist onto a Spotify playlist.
///
/// One run logs in, extracts the source tracks, resolves them one at a time
/// and finally replaces the whole target playlist. Any error ends the run
/// before the playlist is touched, except for a failure of the replace call
/// itself.
pub struct PlaylistSynchronizer<'a, C: SpotifyClient> {
    client: &'a C,
    credentials: SpotifyCredentials,
    options: SyncOptions,
    state: SyncState,
}

impl<'a, C: SpotifyClient> PlaylistSynchronizer<'a, C> {
    pub fn new(client: &'a C, credentials: SpotifyCredentials, options: SyncOptions) -> Self {
        Self {
            client,
            credentials,
            options,
            state: SyncState::Idle,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    fn transition(&mut self, next: SyncState) {
        log::debug!("Sync state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    pub async fn run(&mut self, page: &dyn RenderedPage) -> Result<SyncReport, SyncError> {
        let result = self.execute(page).await;
        match &result {
            Ok(_) => self.transition(SyncState::Done),
            Err(e) => {
                log::error!("Sync failed while {:?}: {}", self.state, e);
                self.transition(SyncState::Failed);
            }
        }
        result
    }

    async fn execute(&mut self, page: &dyn RenderedPage) -> Result<SyncReport, SyncError> {
        self.transition(SyncState::Authenticating);
        let session = match self.client.authenticate(&self.credentials).await {
            Session::Authenticated(session) => session,
            Session::Unauthenticated { reason } => {
                return Err(SyncError::Authentication { reason });
            }
        };

        self.transition(SyncState::Extracting);
        let tracks = extract_tracks(page).await?;
        log::info!("[APPLE] Loaded {} songs", tracks.len());

        self.transition(SyncState::Resolving);
        let playlist_id = self.options.playlist_id.clone();
        log::info!("[SPOTIFY] Target Playlist ID: {}", playlist_id);

        let resolver = TrackResolver::new(self.client, &session);
        let mut resolved = Vec::with_capacity(tracks.len());
        for track in tracks {
            let matched = resolver.search_track(&track).await?;
            resolved.push((track, matched));
        }

        let mut report = SyncReport {
            playlist_id,
            tracks: resolved,
            updated: false,
        };

        if self.options.dry_run {
            log::info!(
                "[SPOTIFY] Dry run: leaving playlist {} untouched ({} tracks resolved)",
                report.playlist_id,
                report.tracks.len()
            );
            return Ok(report);
        }

        self.transition(SyncState::Updating);
        if report.tracks.is_empty() {
            log::warn!(
                "[SPOTIFY] Source playlist is empty, playlist {} will be cleared",
                report.playlist_id
            );
        }
        log::info!("[SPOTIFY] Updating playlist {}", report.playlist_id);
        self.client
            .replace_playlist_tracks(&session, &report.playlist_id, &report.uris())
            .await?;
        report.updated = true;

        Ok(report)
    }
}
