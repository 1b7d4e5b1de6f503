use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::core::batch::{download_selected, CancelToken};
use crate::core::catalog::{Catalog, Resolution};
use crate::error::CoreError;
use crate::models::{ArtistRecord, BatchResult, DownloadProgress, SearchMode, TrackRecord};
use crate::sources::Fetcher;

/// Messages posted from background workers to the thread that owns the UI state.
#[derive(Debug)]
pub enum Event {
    Status(String),
    TracksReady {
        tracks: Vec<TrackRecord>,
        default_checked: bool,
    },
    ArtistsAmbiguous(Vec<ArtistRecord>),
    Warning(String),
    Error(String),
    Progress(DownloadProgress),
    BatchComplete(BatchResult),
}

type Notifier = Arc<dyn Fn() + Send + Sync>;

/// Runs each user action on its own thread and reports back through `Event`s.
/// Input is validated on the calling thread; rejected input spawns nothing.
pub struct Controller {
    catalog: Arc<Catalog<Arc<dyn Fetcher>>>,
    tx: Sender<Event>,
    notify: Option<Notifier>,
}

impl Controller {
    pub fn new(fetcher: Arc<dyn Fetcher>, base_url: &str, tx: Sender<Event>) -> Result<Self, CoreError> {
        Ok(Self {
            catalog: Arc::new(Catalog::new(fetcher, base_url)?),
            tx,
            notify: None,
        })
    }

    /// Called after every posted event, e.g. to wake an idle GUI.
    pub fn with_notifier(mut self, notify: impl Fn() + Send + Sync + 'static) -> Self {
        self.notify = Some(Arc::new(notify));
        self
    }

    fn poster(&self) -> Poster {
        Poster {
            tx: self.tx.clone(),
            notify: self.notify.clone(),
        }
    }

    pub fn on_search_requested(&self, query: &str, mode: SearchMode, limit: usize) -> Result<(), CoreError> {
        let query = query.trim().to_string();
        if query.is_empty() {
            return Err(CoreError::UserInput("enter a search query or a link".to_string()));
        }
        let limit = limit.max(1);

        let catalog = Arc::clone(&self.catalog);
        let post = self.poster();
        post.send(Event::Status("Searching...".to_string()));

        std::thread::spawn(move || match catalog.resolve(&query, mode, limit) {
            Ok(resolution) => post.resolution(resolution),
            Err(e) => post.send(Event::Error(e.to_string())),
        });
        Ok(())
    }

    pub fn on_artist_chosen(&self, artist: ArtistRecord) {
        let catalog = Arc::clone(&self.catalog);
        let post = self.poster();
        post.send(Event::Status(format!("Collecting tracks of {}...", artist.name)));

        std::thread::spawn(move || match catalog.artist_tracks(&artist.profile_url) {
            Ok(resolution) => post.resolution(resolution),
            Err(e) => post.send(Event::Error(e.to_string())),
        });
    }

    /// Starts a batch and returns the token that stops it between files.
    pub fn on_download_requested(
        &self,
        selected: Vec<TrackRecord>,
        folder: &Path,
    ) -> Result<CancelToken, CoreError> {
        if folder.as_os_str().is_empty() {
            return Err(CoreError::UserInput("choose a destination folder".to_string()));
        }
        if !folder.is_dir() {
            return Err(CoreError::UserInput(format!(
                "{} is not an existing folder",
                folder.display()
            )));
        }
        if selected.is_empty() {
            return Err(CoreError::UserInput("no tracks selected".to_string()));
        }

        let cancel = CancelToken::new();
        let token = cancel.clone();
        let catalog = Arc::clone(&self.catalog);
        let folder: PathBuf = folder.to_path_buf();
        let post = self.poster();
        post.send(Event::Status(format!("Downloading {} tracks...", selected.len())));

        std::thread::spawn(move || {
            let result = download_selected(catalog.fetcher(), &selected, &folder, &token, |p| {
                post.send(Event::Progress(p));
            });
            post.send(Event::BatchComplete(result));
        });
        Ok(cancel)
    }
}

struct Poster {
    tx: Sender<Event>,
    notify: Option<Notifier>,
}

impl Poster {
    fn send(&self, event: Event) {
        // The receiver is gone only when the UI has shut down.
        if self.tx.send(event).is_ok() {
            if let Some(notify) = &self.notify {
                notify();
            }
        }
    }

    fn resolution(&self, resolution: Resolution) {
        match resolution {
            Resolution::Tracks {
                tracks,
                default_checked,
                warning,
            } => {
                if let Some(warning) = warning {
                    self.send(Event::Warning(warning));
                }
                self.send(Event::TracksReady {
                    tracks,
                    default_checked,
                });
            }
            Resolution::Ambiguous(artists) => self.send(Event::ArtistsAmbiguous(artists)),
        }
    }
}
