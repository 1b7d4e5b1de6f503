use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::catalog::DEFAULT_SEARCH_LIMIT;

pub const DEFAULT_BASE_URL: &str = "https://mp3party.net";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub user_agent: String,
    pub page_timeout_secs: u64,
    pub download_timeout_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_timeout_secs: 15,
            download_timeout_secs: 30,
        }
    }
}

impl SiteConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs.max(1))
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Folder preselected in the GUI and used by the CLI when `--dest` is absent.
    pub folder: Option<PathBuf>,
    pub search_limit: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            folder: None,
            search_limit: 20,
        }
    }
}

impl DownloadConfig {
    pub fn limit(&self) -> usize {
        self.search_limit.clamp(1, DEFAULT_SEARCH_LIMIT)
    }
}

fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("mp3party-dl")
        .join("config.toml")
}

pub fn load_config() -> Config {
    let path = config_path();
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(content) => parse_config(&content),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "config unreadable, using defaults");
            Config::default()
        }
    }
}

fn parse_config(content: &str) -> Config {
    toml::from_str(content).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "invalid config, using defaults");
        Config::default()
    })
}

pub fn save_config(config: &Config) -> Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg = parse_config("[site]\npage_timeout_secs = 5\n");
        assert_eq!(cfg.site.page_timeout_secs, 5);
        assert_eq!(cfg.site.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.download.search_limit, 20);
    }

    #[test]
    fn test_invalid_config_falls_back() {
        let cfg = parse_config("site = 3");
        assert_eq!(cfg.site.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_limit_is_clamped() {
        let cfg = DownloadConfig {
            folder: None,
            search_limit: 500,
        };
        assert_eq!(cfg.limit(), DEFAULT_SEARCH_LIMIT);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut cfg = Config::default();
        cfg.download.folder = Some(PathBuf::from("/music"));
        let text = toml::to_string_pretty(&cfg).unwrap();
        let back = parse_config(&text);
        assert_eq!(back.download.folder, Some(PathBuf::from("/music")));
    }
}
