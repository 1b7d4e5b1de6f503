use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use crate::error::CoreError;
use crate::sources::Fetcher;

pub const CHUNK_SIZE: usize = 8192;

/// Streams `url` into `destination` (created or truncated) and returns the
/// number of bytes written.
///
/// `on_progress` gets `written / total` after every chunk when the server
/// declared a length, and is never called otherwise. On failure the
/// partial file is left on disk.
pub fn download_to_file<F, P>(
    fetcher: &F,
    url: &str,
    destination: &Path,
    mut on_progress: P,
) -> Result<u64, CoreError>
where
    F: Fetcher + ?Sized,
    P: FnMut(f64),
{
    let mut stream = fetcher.open_stream(url)?;
    let total = stream.content_length.filter(|&len| len > 0);

    let mut file =
        File::create(destination).map_err(|e| CoreError::filesystem(destination, e))?;

    let mut buf = [0u8; CHUNK_SIZE];
    let mut written: u64 = 0;
    loop {
        let n = match stream.body.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(CoreError::network(url, format!("read failed: {e}"))),
        };

        file.write_all(&buf[..n])
            .map_err(|e| CoreError::filesystem(destination, e))?;
        written += n as u64;

        if let Some(total) = total {
            on_progress((written as f64 / total as f64).min(1.0));
        }
    }

    file.flush().map_err(|e| CoreError::filesystem(destination, e))?;
    tracing::debug!(url, bytes = written, path = %destination.display(), "download finished");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::io;

    use tempfile::TempDir;

    use super::*;
    use crate::sources::fake::FakeFetcher;
    use crate::sources::RemoteStream;

    const URL: &str = "https://cdn/song.mp3";

    #[test]
    fn test_writes_all_bytes_with_progress() {
        let bytes: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        let fetcher = FakeFetcher::new().file(URL, &bytes, true);
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("song.mp3");

        let mut reports = Vec::new();
        let written = download_to_file(&fetcher, URL, &dest, |p| reports.push(p)).unwrap();

        assert_eq!(written, 20_000);
        assert_eq!(std::fs::read(&dest).unwrap(), bytes);
        // 8192 + 8192 + 3616
        assert_eq!(reports.len(), 3);
        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*reports.last().unwrap(), 1.0);
    }

    #[test]
    fn test_no_progress_without_length() {
        let fetcher = FakeFetcher::new().file(URL, &[1u8; 10_000], false);
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("song.mp3");

        let mut calls = 0;
        let written = download_to_file(&fetcher, URL, &dest, |_| calls += 1).unwrap();

        assert_eq!(written, 10_000);
        assert_eq!(calls, 0);
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 10_000);
    }

    #[test]
    fn test_truncates_existing_file() {
        let fetcher = FakeFetcher::new().file(URL, b"new", true);
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("song.mp3");
        std::fs::write(&dest, b"much longer old content").unwrap();

        download_to_file(&fetcher, URL, &dest, |_| {}).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    }

    #[test]
    fn test_progress_capped_when_server_sends_more() {
        struct Lying;
        impl Fetcher for Lying {
            fn fetch_page(&self, url: &str) -> Result<String, CoreError> {
                Err(CoreError::network(url, "unused"))
            }
            fn open_stream(&self, _url: &str) -> Result<RemoteStream, CoreError> {
                Ok(RemoteStream {
                    content_length: Some(100),
                    body: Box::new(io::Cursor::new(vec![0u8; 300])),
                })
            }
        }

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("song.mp3");
        let mut reports = Vec::new();
        let written = download_to_file(&Lying, URL, &dest, |p| reports.push(p)).unwrap();
        assert_eq!(written, 300);
        assert!(reports.iter().all(|&p| p <= 1.0));
    }

    #[test]
    fn test_fetch_failure_creates_nothing() {
        let fetcher = FakeFetcher::new();
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("song.mp3");

        let result = download_to_file(&fetcher, URL, &dest, |_| {});
        assert!(matches!(result, Err(CoreError::Network { .. })));
        assert!(!dest.exists());
    }

    #[test]
    fn test_read_failure_keeps_partial_file() {
        struct Broken {
            sent: bool,
        }
        impl Read for Broken {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.sent {
                    return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
                }
                self.sent = true;
                buf[..4].copy_from_slice(b"part");
                Ok(4)
            }
        }
        struct Flaky;
        impl Fetcher for Flaky {
            fn fetch_page(&self, url: &str) -> Result<String, CoreError> {
                Err(CoreError::network(url, "unused"))
            }
            fn open_stream(&self, _url: &str) -> Result<RemoteStream, CoreError> {
                Ok(RemoteStream {
                    content_length: Some(1000),
                    body: Box::new(Broken { sent: false }),
                })
            }
        }

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("song.mp3");
        let result = download_to_file(&Flaky, URL, &dest, |_| {});
        assert!(matches!(result, Err(CoreError::Network { .. })));
        assert_eq!(std::fs::read(&dest).unwrap(), b"part");
    }

    #[test]
    fn test_missing_folder_is_filesystem_error() {
        let fetcher = FakeFetcher::new().file(URL, b"abc", true);
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("no-such-dir").join("song.mp3");

        let result = download_to_file(&fetcher, URL, &dest, |_| {});
        assert!(matches!(result, Err(CoreError::Filesystem { .. })));
    }
}
