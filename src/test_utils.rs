use color_eyre::eyre::eyre;

use crate::ports::page::{MockPageElement, MockRenderedPage, PageElement};
use crate::services::extractor::{ARTIST_SELECTOR, SONG_NAME_SELECTOR, SONG_ROW_SELECTOR};

/// Leaf element with fixed text and no children.
pub fn text_element(text: &str) -> Box<dyn PageElement> {
    let text = text.to_string();
    let mut element = MockPageElement::new();
    element.expect_text().returning(move || Ok(text.clone()));
    element
        .expect_query_all()
        .returning(|_| Ok(Vec::new()));
    Box::new(element)
}

/// Song row with a title element and, when given, an artist element.
pub fn song_row(title: &str, artist: Option<&str>) -> Box<dyn PageElement> {
    let title = title.to_string();
    let artist = artist.map(str::to_string);
    let mut row = MockPageElement::new();
    row.expect_query_all().returning(move |selector| match selector {
        SONG_NAME_SELECTOR => Ok(vec![text_element(&title)]),
        ARTIST_SELECTOR => Ok(artist.iter().map(|artist| text_element(artist)).collect()),
        other => Err(eyre!("unexpected selector: {}", other)),
    });
    Box::new(row)
}

/// Rendered playlist page whose song rows hold the given (title, artist) pairs.
pub fn playlist_page(rows: &[(&str, Option<&str>)]) -> MockRenderedPage {
    let rows: Vec<(String, Option<String>)> = rows
        .iter()
        .map(|(title, artist)| (title.to_string(), artist.map(str::to_string)))
        .collect();

    let mut page = MockRenderedPage::new();
    page.expect_query_all().returning(move |selector| {
        if selector != SONG_ROW_SELECTOR {
            return Err(eyre!("unexpected selector: {}", selector));
        }
        Ok(rows
            .iter()
            .map(|(title, artist)| song_row(title, artist.as_deref()))
            .collect())
    });
    page
}
