use crate::ports::page::{PageElement, RenderedPage};
use crate::track::Track;

/// One row per song in the Apple Music playlist view.
pub const SONG_ROW_SELECTOR: &str = ".songs-list-row__song-wrapper";
/// Song title, nested in a row.
pub const SONG_NAME_SELECTOR: &str = ".songs-list-row__song-name";
/// Artist link, nested in a row.
pub const ARTIST_SELECTOR: &str = ".click-action";

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Failed to find song rows on the source page: {0}")]
    SongRows(color_eyre::Report),
    #[error("Failed to find song name element in row {row}: {reason}")]
    SongNameLookup {
        row: usize,
        reason: color_eyre::Report,
    },
    #[error("Song row {row} has no song name element")]
    MissingSongName { row: usize },
    #[error("Failed to read song name in row {row}: {reason}")]
    SongNameText {
        row: usize,
        reason: color_eyre::Report,
    },
}

/// Reads every song row of the page into a [`Track`], in document order.
///
/// The title is mandatory. The artist is read on a best-effort basis and
/// falls back to an empty string.
pub async fn extract_tracks(page: &dyn RenderedPage) -> Result<Vec<Track>, ExtractionError> {
    let rows = page
        .query_all(SONG_ROW_SELECTOR)
        .await
        .map_err(ExtractionError::SongRows)?;

    log::debug!("Found {} song rows on the source page", rows.len());

    let mut tracks = Vec::with_capacity(rows.len());
    for (row, element) in rows.iter().enumerate() {
        let track = parse_song_row(row, element.as_ref()).await?;
        log::info!("[APPLE] Song loaded: {}", track);
        tracks.push(track);
    }

    Ok(tracks)
}

async fn parse_song_row(row: usize, element: &dyn PageElement) -> Result<Track, ExtractionError> {
    let names = element
        .query_all(SONG_NAME_SELECTOR)
        .await
        .map_err(|reason| ExtractionError::SongNameLookup { row, reason })?;
    let name = names
        .first()
        .ok_or(ExtractionError::MissingSongName { row })?;
    let title = name
        .text()
        .await
        .map_err(|reason| ExtractionError::SongNameText { row, reason })?;

    Ok(Track::new(title.trim(), read_artist(row, element).await))
}

async fn read_artist(row: usize, element: &dyn PageElement) -> String {
    let artists = match element.query_all(ARTIST_SELECTOR).await {
        Ok(artists) => artists,
        Err(e) => {
            log::debug!("No artist element in row {}: {}", row, e);
            return String::new();
        }
    };

    let Some(artist) = artists.first() else {
        return String::new();
    };

    match artist.text().await {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            log::debug!("Failed to read artist in row {}: {}", row, e);
            String::new()
        }
    }
}
