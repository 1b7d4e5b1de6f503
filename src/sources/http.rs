use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};

use crate::config::SiteConfig;
use crate::error::CoreError;
use crate::sources::{Fetcher, RemoteStream};

/// Blocking HTTP client for the music site.
/// Listing pages and file downloads use separate clients so each gets its own timeout.
pub struct HttpFetcher {
    pages: Client,
    files: Client,
}

impl HttpFetcher {
    pub fn new(site: &SiteConfig) -> Result<Self> {
        let pages = Client::builder()
            .user_agent(site.user_agent.as_str())
            .timeout(site.page_timeout())
            .build()
            .context("failed to build HTTP client")?;

        let files = Client::builder()
            .user_agent(site.user_agent.as_str())
            .timeout(site.download_timeout())
            .build()
            .context("failed to build download client")?;

        Ok(Self { pages, files })
    }

    fn get(client: &Client, url: &str) -> Result<Response, CoreError> {
        tracing::debug!(url, "GET");
        let response = client
            .get(url)
            .send()
            .map_err(|e| CoreError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::Network {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: format!("HTTP {status}"),
            });
        }
        Ok(response)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_page(&self, url: &str) -> Result<String, CoreError> {
        Self::get(&self.pages, url)?
            .text()
            .map_err(|e| CoreError::from_reqwest(url, e))
    }

    fn open_stream(&self, url: &str) -> Result<RemoteStream, CoreError> {
        let response = Self::get(&self.files, url)?;
        Ok(RemoteStream {
            content_length: response.content_length(),
            body: Box::new(response),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::DEFAULT_USER_AGENT;

    /// Starts a mock server from a tokio runtime; the blocking client is then
    /// used from the plain test thread, outside the runtime.
    fn start_server(rt: &tokio::runtime::Runtime, mocks: Vec<Mock>) -> MockServer {
        rt.block_on(async {
            let server = MockServer::start().await;
            for mock in mocks {
                mock.mount(&server).await;
            }
            server
        })
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&SiteConfig::default()).expect("client")
    }

    #[test]
    fn test_fetch_page_sends_user_agent() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let server = start_server(
            &rt,
            vec![Mock::given(method("GET"))
                .and(path("/search"))
                .and(query_param("q", "daft punk"))
                .and(header("user-agent", DEFAULT_USER_AGENT))
                .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))],
        );

        let url = format!("{}/search?q=daft+punk", server.uri());
        let body = fetcher().fetch_page(&url).expect("page");
        assert_eq!(body, "<html>ok</html>");
    }

    #[test]
    fn test_fetch_page_maps_status_to_network_error() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let server = start_server(
            &rt,
            vec![Mock::given(method("GET"))
                .and(path("/missing"))
                .respond_with(ResponseTemplate::new(404))],
        );

        let url = format!("{}/missing", server.uri());
        match fetcher().fetch_page(&url) {
            Err(CoreError::Network {
                url: failed, status, ..
            }) => {
                assert_eq!(status, Some(404));
                assert_eq!(failed, url);
            }
            other => panic!("expected network error, got {:?}", other),
        }
    }

    #[test]
    fn test_open_stream_reports_length_and_body() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let bytes = vec![7u8; 20_000];
        let server = start_server(
            &rt,
            vec![Mock::given(method("GET"))
                .and(path("/track.mp3"))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.clone()))],
        );

        let url = format!("{}/track.mp3", server.uri());
        let mut stream = fetcher().open_stream(&url).expect("stream");
        assert_eq!(stream.content_length, Some(20_000));

        let mut received = Vec::new();
        stream.body.read_to_end(&mut received).unwrap();
        assert_eq!(received, bytes);
    }

    #[test]
    fn test_connection_refused_is_network_error() {
        // Port 9 (discard) is not listening on test machines.
        let result = fetcher().fetch_page("http://127.0.0.1:9/");
        assert!(matches!(result, Err(CoreError::Network { status: None, .. })));
    }

    /// Hits the real site. Run with: cargo test http -- --ignored
    #[test]
    #[ignore]
    fn test_live_search_page() {
        let html = fetcher()
            .fetch_page("https://mp3party.net/search?q=muse")
            .expect("live search");
        assert!(html.contains("track__user-panel"));
    }
}
