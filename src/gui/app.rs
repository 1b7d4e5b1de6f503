use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;

use anyhow::{Context, Result};
use egui::Color32;

use crate::config::Config;
use crate::core::batch::CancelToken;
use crate::core::catalog::DEFAULT_SEARCH_LIMIT;
use crate::core::worker::{Controller, Event};
use crate::models::{ArtistRecord, SearchMode, TrackRecord};
use crate::sources::http::HttpFetcher;

pub struct DownloaderApp {
    // Request
    mode: SearchMode,
    query: String,
    limit: usize,
    folder: String,

    // Results
    tracks: Vec<TrackRecord>,
    checked: Vec<bool>,
    artists: Vec<ArtistRecord>,
    artist_choice: Option<usize>,

    // Background tasks
    controller: Controller,
    rx: mpsc::Receiver<Event>,
    searching: bool,
    batch: Option<CancelToken>,
    progress: f32,
    status: String,
    notice: Option<(Color32, String)>,
}

impl DownloaderApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: Config) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let fetcher = HttpFetcher::new(&config.site)?;
        let ctx = cc.egui_ctx.clone();
        let controller = Controller::new(Arc::new(fetcher), &config.site.base_url, tx)
            .context("invalid site URL in config")?
            .with_notifier(move || ctx.request_repaint());

        Ok(Self {
            mode: SearchMode::Search,
            query: String::new(),
            limit: config.download.limit(),
            folder: config
                .download
                .folder
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            tracks: Vec::new(),
            checked: Vec::new(),
            artists: Vec::new(),
            artist_choice: None,
            controller,
            rx,
            searching: false,
            batch: None,
            progress: 0.0,
            status: "Ready".to_string(),
            notice: None,
        })
    }

    fn start_search(&mut self) {
        self.notice = None;
        self.progress = 0.0;
        self.clear_tracks();

        match self
            .controller
            .on_search_requested(&self.query, self.mode, self.limit)
        {
            Ok(()) => self.searching = true,
            Err(e) => self.show_error(e.to_string()),
        }
    }

    fn choose_artist(&mut self, index: usize) {
        if index >= self.artists.len() {
            return;
        }
        let artist = self.artists.swap_remove(index);
        self.artists.clear();
        self.artist_choice = None;
        self.searching = true;
        self.controller.on_artist_chosen(artist);
    }

    fn start_download(&mut self) {
        self.notice = None;
        let selected: Vec<TrackRecord> = self
            .tracks
            .iter()
            .zip(&self.checked)
            .filter(|(_, checked)| **checked)
            .map(|(track, _)| track.clone())
            .collect();

        match self
            .controller
            .on_download_requested(selected, Path::new(self.folder.trim()))
        {
            Ok(token) => {
                self.progress = 0.0;
                self.batch = Some(token);
            }
            Err(e) => self.show_error(e.to_string()),
        }
    }

    fn stop_download(&mut self) {
        if let Some(token) = &self.batch {
            token.cancel();
            self.status = "Stopping after the current file...".to_string();
        }
    }

    fn clear_tracks(&mut self) {
        self.tracks.clear();
        self.checked.clear();
    }

    fn set_all(&mut self, value: bool) {
        self.checked.iter_mut().for_each(|c| *c = value);
    }

    fn show_error(&mut self, msg: String) {
        self.notice = Some((Color32::LIGHT_RED, msg));
    }

    fn process_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Event::Status(msg) => self.status = msg,
                Event::TracksReady {
                    tracks,
                    default_checked,
                } => {
                    self.checked = vec![default_checked; tracks.len()];
                    self.tracks = tracks;
                    self.searching = false;
                    self.progress = 0.0;
                    self.status = "Ready".to_string();
                }
                Event::ArtistsAmbiguous(artists) => {
                    self.artists = artists;
                    self.artist_choice = None;
                    self.searching = false;
                    self.status = "Waiting for artist choice".to_string();
                }
                Event::Warning(msg) => self.notice = Some((Color32::YELLOW, msg)),
                Event::Error(msg) => {
                    self.searching = false;
                    self.status = "Ready".to_string();
                    self.show_error(msg);
                }
                Event::Progress(p) => self.progress = p.overall as f32,
                Event::BatchComplete(result) => {
                    self.batch = None;
                    self.progress = 0.0;
                    self.status = "Ready".to_string();
                    let color = if result.failed.is_empty() {
                        Color32::LIGHT_GREEN
                    } else {
                        Color32::YELLOW
                    };
                    let mut text = format!("Download finished: {}", result.summary());
                    for (track, err) in result.failed.iter().take(3) {
                        text.push_str(&format!("\n{}: {}", track.summary(), err));
                    }
                    self.notice = Some((color, text));
                }
            }
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("MP3Party Downloader");
        ui.separator();

        ui.label("Mode");
        ui.horizontal(|ui| {
            ui.radio_value(&mut self.mode, SearchMode::Search, "Song search");
            ui.radio_value(&mut self.mode, SearchMode::Artist, "All songs of an artist");
        });
        ui.add_space(6.0);

        ui.label("Query / URL");
        ui.horizontal(|ui| {
            let response = ui.text_edit_singleline(&mut self.query);
            let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            let clicked = ui
                .add_enabled(!self.searching, egui::Button::new("Find"))
                .clicked();
            if (clicked || enter) && !self.searching {
                self.start_search();
            }
        });
        ui.add_enabled(
            self.mode == SearchMode::Search,
            egui::Slider::new(&mut self.limit, 1..=DEFAULT_SEARCH_LIMIT).text("max results"),
        );
        ui.add_space(6.0);

        ui.label("Save to folder");
        ui.horizontal(|ui| {
            ui.text_edit_singleline(&mut self.folder);
            if ui.button("Choose...").clicked() {
                if let Some(folder) = rfd::FileDialog::new().pick_folder() {
                    self.folder = folder.display().to_string();
                }
            }
        });
        ui.add_space(6.0);

        let idle = self.batch.is_none();
        ui.horizontal(|ui| {
            if ui.add_enabled(idle, egui::Button::new("Select all")).clicked() {
                self.set_all(true);
            }
            if ui.add_enabled(idle, egui::Button::new("Select none")).clicked() {
                self.set_all(false);
            }
        });
        ui.add_space(10.0);

        ui.add(egui::ProgressBar::new(self.progress).show_percentage());
        ui.horizontal(|ui| {
            if self.searching || !idle {
                ui.spinner();
            }
            ui.label(&self.status);
        });

        ui.horizontal(|ui| {
            if ui
                .add_enabled(idle, egui::Button::new("Download selected"))
                .clicked()
            {
                self.start_download();
            }
            if ui.add_enabled(!idle, egui::Button::new("Stop")).clicked() {
                self.stop_download();
            }
        });

        if let Some((color, text)) = &self.notice {
            ui.add_space(6.0);
            ui.colored_label(*color, text.as_str());
        }
    }

    fn track_list(&mut self, ui: &mut egui::Ui) {
        ui.heading("Tracks");
        ui.separator();

        if self.tracks.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label("Search for songs or an artist to list tracks");
            });
            return;
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            for (track, checked) in self.tracks.iter().zip(self.checked.iter_mut()) {
                ui.horizontal(|ui| {
                    ui.checkbox(checked, track.summary());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.hyperlink_to("Open", track.remote_url());
                    });
                });
            }
        });
    }

    fn artist_window(&mut self, ctx: &egui::Context) {
        if self.artists.is_empty() {
            return;
        }

        let mut open = true;
        let mut chosen = None;
        egui::Window::new("Choose an artist")
            .collapsible(false)
            .default_size([480.0, 320.0])
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label("Several artists were found. Pick one:");
                egui::ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
                    for (i, artist) in self.artists.iter().enumerate() {
                        let selected = self.artist_choice == Some(i);
                        let response = ui.selectable_label(selected, &artist.name);
                        if response.clicked() {
                            self.artist_choice = Some(i);
                        }
                        if response.double_clicked() {
                            chosen = Some(i);
                        }
                    }
                });
                ui.separator();
                if ui
                    .add_enabled(self.artist_choice.is_some(), egui::Button::new("Select"))
                    .clicked()
                {
                    chosen = self.artist_choice;
                }
            });

        if let Some(index) = chosen {
            self.choose_artist(index);
        } else if !open {
            self.artists.clear();
            self.artist_choice = None;
            self.status = "Ready".to_string();
        }
    }
}

impl eframe::App for DownloaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_events();

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Tracks: {}", self.tracks.len()));
                ui.label("|");
                ui.label(format!(
                    "Selected: {}",
                    self.checked.iter().filter(|c| **c).count()
                ));
            });
        });

        egui::SidePanel::left("controls")
            .resizable(false)
            .min_width(300.0)
            .show(ctx, |ui| self.controls(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.track_list(ui));

        self.artist_window(ctx);
    }
}
