pub mod http;

use std::io::Read;

use crate::error::CoreError;

/// An open response body plus the length the server declared, if any.
pub struct RemoteStream {
    pub content_length: Option<u64>,
    pub body: Box<dyn Read + Send>,
}

/// Network access used by the catalog walker and the download engine.
/// `HttpFetcher` talks to the real site; tests swap in an in-memory one.
pub trait Fetcher: Send + Sync {
    /// Fetches a listing page and returns its body as text.
    fn fetch_page(&self, url: &str) -> Result<String, CoreError>;
    /// Opens a streaming GET for a file download.
    fn open_stream(&self, url: &str) -> Result<RemoteStream, CoreError>;
}

impl<F: Fetcher + ?Sized> Fetcher for std::sync::Arc<F> {
    fn fetch_page(&self, url: &str) -> Result<String, CoreError> {
        (**self).fetch_page(url)
    }

    fn open_stream(&self, url: &str) -> Result<RemoteStream, CoreError> {
        (**self).open_stream(url)
    }
}
