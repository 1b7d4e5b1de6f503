use scraper::{Html, Selector};
use url::Url;

use crate::error::CoreError;
use crate::models::{ArtistRecord, TrackRecord, UNKNOWN_NAME};

const TRACK_PANEL: &str = ".track__user-panel";
const ATTR_AUDIO_URL: &str = "data-js-url";
const ATTR_TITLE: &str = "data-js-song-title";
const ATTR_ARTIST: &str = "data-js-artist-name";
const ARTIST_LINK: &str = "a[href*='/artist/']";
const NEXT_PAGE_LINK: &str = ".paginate a.next_page";

fn selector(css: &str) -> Result<Selector, CoreError> {
    Selector::parse(css).map_err(|e| CoreError::Parse(format!("invalid selector {css}: {e}")))
}

/// Extracts every track panel that carries an audio URL, in document order.
/// Panels without one (promotional blocks) are skipped.
pub fn parse_track_panels(html: &str) -> Result<Vec<TrackRecord>, CoreError> {
    let document = Html::parse_document(html);
    let panel_sel = selector(TRACK_PANEL)?;

    let tracks = document
        .select(&panel_sel)
        .filter_map(|panel| {
            let attrs = panel.value();
            TrackRecord::new(
                attrs.attr(ATTR_AUDIO_URL)?,
                attrs.attr(ATTR_TITLE),
                attrs.attr(ATTR_ARTIST),
            )
        })
        .collect();

    Ok(tracks)
}

/// Extracts artist profile links, resolved against `base` and
/// de-duplicated by URL. The first occurrence's text wins.
pub fn parse_artist_links(html: &str, base: &Url) -> Result<Vec<ArtistRecord>, CoreError> {
    let document = Html::parse_document(html);
    let link_sel = selector(ARTIST_LINK)?;

    let mut artists: Vec<ArtistRecord> = Vec::new();
    for link in document.select(&link_sel) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href.trim()) else {
            tracing::debug!(href, "skipping unresolvable artist link");
            continue;
        };
        let profile_url = resolved.to_string();
        if artists.iter().any(|a| a.profile_url == profile_url) {
            continue;
        }

        let text = link.text().collect::<String>();
        let name = text.trim();
        artists.push(ArtistRecord {
            name: if name.is_empty() {
                UNKNOWN_NAME.to_string()
            } else {
                name.to_string()
            },
            profile_url,
        });
    }

    Ok(artists)
}

/// Returns the absolute URL of the pagination "next" link, if the page has one.
pub fn parse_next_page_link(html: &str, base: &Url) -> Result<Option<String>, CoreError> {
    let document = Html::parse_document(html);
    let next_sel = selector(NEXT_PAGE_LINK)?;

    let next = document
        .select(&next_sel)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .and_then(|href| base.join(href).ok())
        .map(|url| url.to_string());

    Ok(next)
}
