use url::form_urlencoded;
use url::Url;

use crate::core::page;
use crate::error::CoreError;
use crate::models::{ArtistRecord, SearchMode, TrackRecord};
use crate::sources::Fetcher;

pub const DEFAULT_SEARCH_LIMIT: usize = 40;

/// Tracks gathered from an artist's pages. `interrupted` holds the error
/// that stopped the walk early, if a later page failed to load.
#[derive(Debug)]
pub struct CatalogResult {
    pub tracks: Vec<TrackRecord>,
    pub interrupted: Option<CoreError>,
}

/// What the UI should do with a search request.
#[derive(Debug)]
pub enum Resolution {
    Tracks {
        tracks: Vec<TrackRecord>,
        default_checked: bool,
        warning: Option<String>,
    },
    /// Several artists matched; the user picks one before the catalog is walked.
    Ambiguous(Vec<ArtistRecord>),
}

/// Walks the site's search and artist pages through a `Fetcher`.
pub struct Catalog<F> {
    fetcher: F,
    base: Url,
}

impl<F: Fetcher> Catalog<F> {
    pub fn new(fetcher: F, base_url: &str) -> Result<Self, CoreError> {
        let base = Url::parse(base_url)
            .map_err(|e| CoreError::Parse(format!("invalid site URL {base_url}: {e}")))?;
        Ok(Self { fetcher, base })
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    fn search_url(&self, query: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let mut url = self.base.clone();
        url.set_path("/search");
        url.set_query(Some(&format!("q={encoded}")));
        url.to_string()
    }

    /// Single-page track search. An `http…` input is fetched as is.
    pub fn search_tracks(&self, query_or_url: &str, limit: usize) -> Result<Vec<TrackRecord>, CoreError> {
        let url = if query_or_url.starts_with("http") {
            query_or_url.to_string()
        } else {
            self.search_url(query_or_url)
        };

        let html = self.fetcher.fetch_page(&url)?;
        let mut tracks = page::parse_track_panels(&html)?;
        tracks.truncate(limit);
        tracing::info!(query = query_or_url, found = tracks.len(), "search finished");
        Ok(tracks)
    }

    pub fn search_artists(&self, name: &str) -> Result<Vec<ArtistRecord>, CoreError> {
        let html = self.fetcher.fetch_page(&self.search_url(name))?;
        let artists = page::parse_artist_links(&html, &self.base)?;
        tracing::info!(name, found = artists.len(), "artist search finished");
        Ok(artists)
    }

    /// Follows the pagination of an artist profile and concatenates every
    /// page's tracks in page order. Failing on the first page is an error;
    /// failing later keeps what was collected.
    pub fn collect_artist_catalog(&self, artist_url: &str) -> Result<CatalogResult, CoreError> {
        let mut tracks = Vec::new();
        let mut visited: Vec<String> = Vec::new();
        let mut page_url = artist_url.to_string();

        loop {
            let html = match self.fetcher.fetch_page(&page_url) {
                Ok(html) => html,
                Err(e) if visited.is_empty() => return Err(e),
                Err(e) => {
                    tracing::warn!(url = %page_url, pages = visited.len(), error = %e, "catalog walk interrupted");
                    return Ok(CatalogResult {
                        tracks,
                        interrupted: Some(e),
                    });
                }
            };

            tracks.extend(page::parse_track_panels(&html)?);
            visited.push(page_url);

            match page::parse_next_page_link(&html, &self.base)? {
                Some(next) if !visited.contains(&next) => page_url = next,
                _ => break,
            }
        }

        tracing::info!(url = artist_url, pages = visited.len(), found = tracks.len(), "catalog collected");
        Ok(CatalogResult {
            tracks,
            interrupted: None,
        })
    }

    /// Profile URL for artist-mode input that is already a URL or a numeric id.
    /// Free text returns `None` and needs an artist search first.
    pub fn artist_url_for(&self, input: &str) -> Option<String> {
        let input = input.trim();
        if input.starts_with("http") {
            return Some(input.to_string());
        }
        if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
            return self
                .base
                .join(&format!("/artist/{input}"))
                .ok()
                .map(|u| u.to_string());
        }
        None
    }

    pub fn resolve(&self, query: &str, mode: SearchMode, limit: usize) -> Result<Resolution, CoreError> {
        let query = query.trim();
        match mode {
            SearchMode::Search => Ok(Resolution::Tracks {
                tracks: self.search_tracks(query, limit)?,
                default_checked: false,
                warning: None,
            }),
            SearchMode::Artist => {
                if let Some(url) = self.artist_url_for(query) {
                    return self.artist_tracks(&url);
                }
                let mut artists = self.search_artists(query)?;
                match artists.len() {
                    0 => Err(CoreError::UserInput(format!("artist not found: {query}"))),
                    1 => {
                        let artist = artists.remove(0);
                        self.artist_tracks(&artist.profile_url)
                    }
                    _ => Ok(Resolution::Ambiguous(artists)),
                }
            }
        }
    }

    /// Catalog collection packaged for the UI: tracks preselected, a partial
    /// walk turned into a warning.
    pub fn artist_tracks(&self, artist_url: &str) -> Result<Resolution, CoreError> {
        let result = self.collect_artist_catalog(artist_url)?;
        Ok(Resolution::Tracks {
            warning: result
                .interrupted
                .map(|e| format!("catalog incomplete ({} tracks loaded): {e}", result.tracks.len())),
            tracks: result.tracks,
            default_checked: true,
        })
    }
}
