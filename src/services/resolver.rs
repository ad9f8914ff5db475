use crate::ports::spotify::{AuthenticatedSession, SpotifyClient};
use crate::spotify_rs::client::SpotifyApiError;
use crate::track::{ResolvedTrack, Track};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("No Spotify match for {track}")]
    NoMatchFound { track: Track },
    #[error("Spotify search failed for {track}: {source}")]
    Request {
        track: Track,
        source: SpotifyApiError,
    },
}

/// Matches source tracks to Spotify tracks.
///
/// The first search result is accepted as-is. Its title and artist are not
/// compared against the query, so a wrong match is possible and is not
/// corrected.
pub struct TrackResolver<'a, C: SpotifyClient> {
    client: &'a C,
    session: &'a AuthenticatedSession,
}

impl<'a, C: SpotifyClient> TrackResolver<'a, C> {
    pub fn new(client: &'a C, session: &'a AuthenticatedSession) -> Self {
        Self { client, session }
    }

    pub async fn search_track(&self, track: &Track) -> Result<ResolvedTrack, ResolveError> {
        let query = track.search_query();
        log::debug!("Searching Spotify for: {}", query);

        let results = self
            .client
            .search_tracks(self.session, &query)
            .await
            .map_err(|source| ResolveError::Request {
                track: track.clone(),
                source,
            })?;

        let first = results
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::NoMatchFound {
                track: track.clone(),
            })?;

        log::info!(
            "[SPOTIFY] Matched {} to '{}' ({})",
            track,
            first.name,
            first.uri
        );

        Ok(ResolvedTrack {
            uri: first.uri,
            name: first.name,
        })
    }
}
