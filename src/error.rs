use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the scrape-and-download pipeline.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Connection failure, timeout or non-success HTTP status.
    #[error("network error fetching {url}: {message}")]
    Network {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// The page did not have the structure we select on.
    #[error("unexpected page structure: {0}")]
    Parse(String),

    /// The destination file could not be created or written.
    #[error("cannot write {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rejected before any background work was started.
    #[error("{0}")]
    UserInput(String),
}

impl CoreError {
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Network {
            url: url.into(),
            status: None,
            message: message.into(),
        }
    }

    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.to_string()
        };
        CoreError::Network {
            url: url.to_string(),
            status: err.status().map(|s| s.as_u16()),
            message,
        }
    }

    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoreError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_message_includes_url() {
        let err = CoreError::Network {
            url: "https://mp3party.net/x".to_string(),
            status: Some(404),
            message: "HTTP 404 Not Found".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("https://mp3party.net/x"));
        assert!(text.contains("404"));
    }

    #[test]
    fn test_filesystem_message_includes_path() {
        let err = CoreError::filesystem(
            "/nope/a.mp3",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("/nope/a.mp3"));
    }
}
