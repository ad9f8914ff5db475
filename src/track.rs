use std::fmt;

/// A song scraped from the source playlist page.
///
/// Duplicates are kept as-is; the position in the extracted list is the
/// position in the target playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub artist: String,
}

impl Track {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
        }
    }

    /// Free-text search query for the target service.
    ///
    /// Title and artist are always joined by a single space, even when the
    /// artist is empty.
    pub fn search_query(&self) -> String {
        format!("{} {}", self.title, self.artist)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' by '{}'", self.title, self.artist)
    }
}

/// A Spotify track matched to a source [`Track`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrack {
    pub uri: String,
    /// Name of the matched Spotify track, kept for logging only.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_joins_title_and_artist() {
        let track = Track::new("Song A", "Artist A");
        assert_eq!(track.search_query(), "Song A Artist A");
    }

    #[test]
    fn test_search_query_keeps_separator_without_artist() {
        let track = Track::new("Song B", "");
        assert_eq!(track.search_query(), "Song B ");
    }

    #[test]
    fn test_display() {
        let track = Track::new("Song A", "Artist A");
        assert_eq!(track.to_string(), "'Song A' by 'Artist A'");
    }
}
