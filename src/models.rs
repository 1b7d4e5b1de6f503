use serde::Serialize;

use crate::error::CoreError;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_NAME: &str = "Unknown";

/// One playable track found on the site. The audio URL is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackRecord {
    remote_url: String,
    title: String,
    artist: String,
}

impl TrackRecord {
    /// Returns `None` when the audio URL is missing or blank.
    /// Blank title/artist fall back to placeholders.
    pub fn new(remote_url: &str, title: Option<&str>, artist: Option<&str>) -> Option<Self> {
        let remote_url = remote_url.trim();
        if remote_url.is_empty() {
            return None;
        }
        Some(Self {
            remote_url: remote_url.to_string(),
            title: non_blank(title).unwrap_or(UNKNOWN_TITLE).to_string(),
            artist: non_blank(artist).unwrap_or(UNKNOWN_ARTIST).to_string(),
        })
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn summary(&self) -> String {
        format!("{} — {}", self.artist, self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistRecord {
    pub name: String,
    pub profile_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Search,
    Artist,
}

/// Progress of a running batch. `index` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownloadProgress {
    pub current: f64,
    pub overall: f64,
    pub index: usize,
    pub total: usize,
}

impl DownloadProgress {
    pub fn new(index: usize, total: usize, current: f64) -> Self {
        let current = current.clamp(0.0, 1.0);
        let overall = if total == 0 {
            0.0
        } else {
            ((index.saturating_sub(1)) as f64 + current) / total as f64
        };
        Self {
            current,
            overall: overall.clamp(0.0, 1.0),
            index,
            total,
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchResult {
    pub succeeded: usize,
    pub failed: Vec<(TrackRecord, CoreError)>,
    pub cancelled: bool,
}

impl BatchResult {
    pub fn summary(&self) -> String {
        let mut text = format!(
            "{} downloaded, {} failed",
            self.succeeded,
            self.failed.len()
        );
        if self.cancelled {
            text.push_str(" (stopped)");
        }
        text
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_requires_url() {
        assert!(TrackRecord::new("", Some("a"), Some("b")).is_none());
        assert!(TrackRecord::new("   ", Some("a"), Some("b")).is_none());
    }

    #[test]
    fn test_track_placeholders() {
        let track = TrackRecord::new("https://x/1.mp3", None, Some("  ")).unwrap();
        assert_eq!(track.title(), UNKNOWN_TITLE);
        assert_eq!(track.artist(), UNKNOWN_ARTIST);
    }

    #[test]
    fn test_progress_overall() {
        let p = DownloadProgress::new(2, 4, 0.5);
        assert!((p.overall - 0.375).abs() < 1e-9);
        let last = DownloadProgress::new(4, 4, 1.0);
        assert!((last.overall - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_batch_summary() {
        let result = BatchResult {
            succeeded: 2,
            failed: Vec::new(),
            cancelled: true,
        };
        assert_eq!(result.summary(), "2 downloaded, 0 failed (stopped)");
    }
}
