use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::download::download_to_file;
use crate::core::filename::safe_filename;
use crate::models::{BatchResult, DownloadProgress, TrackRecord};
use crate::sources::Fetcher;

/// Stop flag shared between the UI and a running batch.
/// Checked between files; the file in flight always finishes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Downloads `tracks` one after another into `folder`.
///
/// A failed file is recorded and the batch moves on. Same-named tracks
/// overwrite each other. After each file, success or not, progress is
/// reported as `i / total`.
pub fn download_selected<F, P>(
    fetcher: &F,
    tracks: &[TrackRecord],
    folder: &Path,
    cancel: &CancelToken,
    mut on_progress: P,
) -> BatchResult
where
    F: Fetcher + ?Sized,
    P: FnMut(DownloadProgress),
{
    let total = tracks.len();
    let mut result = BatchResult::default();

    for (i, track) in tracks.iter().enumerate() {
        let index = i + 1;
        if cancel.is_cancelled() {
            tracing::info!(done = i, total, "batch stopped");
            result.cancelled = true;
            break;
        }

        let destination = folder.join(safe_filename(track.artist(), track.title()));
        if destination.exists() {
            tracing::debug!(path = %destination.display(), "overwriting existing file");
        }

        let outcome = download_to_file(fetcher, track.remote_url(), &destination, |p| {
            on_progress(DownloadProgress::new(index, total, p));
        });

        match outcome {
            Ok(bytes) => {
                tracing::info!(file = %destination.display(), bytes, "downloaded");
                result.succeeded += 1;
            }
            Err(e) => {
                tracing::warn!(url = track.remote_url(), error = %e, "download failed");
                result.failed.push((track.clone(), e));
            }
        }

        on_progress(DownloadProgress::new(index, total, 1.0));
    }

    tracing::info!(
        succeeded = result.succeeded,
        failed = result.failed.len(),
        "batch finished"
    );
    result
}
