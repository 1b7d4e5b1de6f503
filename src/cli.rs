use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use dialoguer::{Input, MultiSelect, Select};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{self, Config};
use crate::core::worker::{Controller, Event};
use crate::models::{ArtistRecord, BatchResult, SearchMode, TrackRecord};
use crate::sources::http::HttpFetcher;

#[derive(Parser)]
#[command(name = "mp3party-dl", about = "Search mp3party.net and download tracks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Run the desktop window
    #[arg(long)]
    pub gui: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search tracks by text or fetch a listing URL
    Search {
        /// Search text or a full URL
        query: String,
        /// Maximum number of results (1-40)
        #[arg(long)]
        limit: Option<usize>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// List (and download) every track of an artist
    Artist {
        /// Artist name, profile URL or numeric id
        artist: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Edit site and download settings
    Config,
}

#[derive(clap::Args)]
pub struct OutputArgs {
    /// Download into this folder; falls back to the configured folder, else only lists
    #[arg(long)]
    dest: Option<PathBuf>,
    /// Download every listed track without asking
    #[arg(long)]
    all: bool,
    /// Print the track list as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Search {
            query,
            limit,
            output,
        }) => cmd_find(&query, SearchMode::Search, limit, &output),
        Some(Commands::Artist { artist, output }) => {
            cmd_find(&artist, SearchMode::Artist, None, &output)
        }
        Some(Commands::Config) => cmd_config(),
        None => {
            if cli.gui || cfg!(feature = "gui") {
                #[cfg(feature = "gui")]
                {
                    crate::gui::launch(config::load_config())
                }
                #[cfg(not(feature = "gui"))]
                {
                    bail!("GUI support is not built in. Rebuild with: cargo build --features gui");
                }
            } else {
                println!("Usage: mp3party-dl <command> or mp3party-dl --gui");
                println!("Run mp3party-dl --help for details.");
                Ok(())
            }
        }
    }
}

struct Session {
    controller: Controller,
    rx: mpsc::Receiver<Event>,
}

impl Session {
    fn open(cfg: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(&cfg.site)?;
        let (tx, rx) = mpsc::channel();
        let controller = Controller::new(Arc::new(fetcher), &cfg.site.base_url, tx)
            .context("invalid site URL in config")?;
        Ok(Self { controller, rx })
    }

    /// Blocks until the worker delivers tracks or an artist list.
    fn wait_for_listing(&self) -> Result<Listing> {
        for event in self.rx.iter() {
            match event {
                Event::Status(msg) => tracing::debug!("{msg}"),
                Event::Warning(msg) => eprintln!("Warning: {msg}"),
                Event::Error(msg) => bail!("{msg}"),
                Event::TracksReady {
                    tracks,
                    default_checked,
                } => return Ok(Listing::Tracks(tracks, default_checked)),
                Event::ArtistsAmbiguous(artists) => return Ok(Listing::Artists(artists)),
                Event::Progress(_) | Event::BatchComplete(_) => {}
            }
        }
        bail!("worker stopped without a result")
    }

    fn wait_for_batch(&self, total: usize) -> Result<BatchResult> {
        let bar = ProgressBar::new(1000);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {percent:>3}% {msg}")
                .context("invalid progress template")?,
        );

        for event in self.rx.iter() {
            match event {
                Event::Progress(p) => {
                    bar.set_position((p.overall * 1000.0).round() as u64);
                    bar.set_message(format!("{}/{}", p.index, total));
                }
                Event::BatchComplete(result) => {
                    bar.finish_and_clear();
                    return Ok(result);
                }
                Event::Error(msg) => bail!("{msg}"),
                _ => {}
            }
        }
        bail!("download worker stopped unexpectedly")
    }
}

enum Listing {
    Tracks(Vec<TrackRecord>, bool),
    Artists(Vec<ArtistRecord>),
}

fn cmd_find(input: &str, mode: SearchMode, limit: Option<usize>, output: &OutputArgs) -> Result<()> {
    let cfg = config::load_config();
    let session = Session::open(&cfg)?;
    let limit = limit
        .map(|l| l.clamp(1, crate::core::catalog::DEFAULT_SEARCH_LIMIT))
        .unwrap_or_else(|| cfg.download.limit());

    session.controller.on_search_requested(input, mode, limit)?;

    let (tracks, default_checked) = match session.wait_for_listing()? {
        Listing::Tracks(tracks, checked) => (tracks, checked),
        Listing::Artists(artists) => {
            let artist = pick_artist(artists)?;
            session.controller.on_artist_chosen(artist);
            match session.wait_for_listing()? {
                Listing::Tracks(tracks, checked) => (tracks, checked),
                Listing::Artists(_) => bail!("artist page did not list any tracks"),
            }
        }
    };

    if tracks.is_empty() {
        println!("No tracks found.");
        return Ok(());
    }

    if output.json {
        println!("{}", serde_json::to_string_pretty(&tracks)?);
    } else {
        print_tracks(&tracks);
    }

    let Some(dest) = output.dest.clone().or(cfg.download.folder) else {
        return Ok(());
    };

    let selected = if output.all {
        tracks
    } else {
        pick_tracks(tracks, default_checked)?
    };
    if selected.is_empty() {
        println!("Nothing selected.");
        return Ok(());
    }

    download(&session, selected, &dest)
}

fn download(session: &Session, selected: Vec<TrackRecord>, dest: &Path) -> Result<()> {
    let total = selected.len();
    session.controller.on_download_requested(selected, dest)?;
    let result = session.wait_for_batch(total)?;

    for (track, err) in &result.failed {
        println!("  failed: {} ({})", track.summary(), err);
    }
    println!("Done: {}", result.summary());
    Ok(())
}

fn print_tracks(tracks: &[TrackRecord]) {
    let mut table = Table::new();
    table.set_header(vec!["#", "Artist", "Title", "URL"]);
    for (i, track) in tracks.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(track.artist()),
            Cell::new(track.title()),
            Cell::new(track.remote_url()),
        ]);
    }
    println!("{table}");
    println!("\n{} tracks", tracks.len());
}

fn pick_artist(mut artists: Vec<ArtistRecord>) -> Result<ArtistRecord> {
    let items: Vec<String> = artists
        .iter()
        .map(|a| format!("{} ({})", a.name, a.profile_url))
        .collect();
    let selection = Select::new()
        .with_prompt("Several artists found, pick one")
        .items(&items)
        .default(0)
        .interact()?;
    Ok(artists.swap_remove(selection))
}

fn pick_tracks(tracks: Vec<TrackRecord>, default_checked: bool) -> Result<Vec<TrackRecord>> {
    let items: Vec<String> = tracks.iter().map(|t| t.summary()).collect();
    let defaults = vec![default_checked; items.len()];
    let chosen = MultiSelect::new()
        .with_prompt("Select tracks (space toggles, enter confirms)")
        .items(&items)
        .defaults(&defaults)
        .interact()?;
    Ok(tracks
        .into_iter()
        .enumerate()
        .filter(|(i, _)| chosen.contains(i))
        .map(|(_, t)| t)
        .collect())
}

fn cmd_config() -> Result<()> {
    let mut cfg = config::load_config();

    println!("mp3party-dl settings\n");

    cfg.site.base_url = Input::new()
        .with_prompt("Site URL")
        .with_initial_text(cfg.site.base_url.clone())
        .interact_text()?;

    cfg.site.page_timeout_secs = Input::new()
        .with_prompt("Page timeout (seconds)")
        .default(cfg.site.page_timeout_secs)
        .interact_text()?;

    cfg.site.download_timeout_secs = Input::new()
        .with_prompt("Download timeout (seconds)")
        .default(cfg.site.download_timeout_secs)
        .interact_text()?;

    cfg.download.search_limit = Input::new()
        .with_prompt("Search results (1-40)")
        .default(cfg.download.search_limit)
        .interact_text()?;

    let current_folder = cfg
        .download
        .folder
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let folder: String = Input::new()
        .with_prompt("Default download folder (empty for none)")
        .with_initial_text(current_folder)
        .allow_empty(true)
        .interact_text()?;
    cfg.download.folder = Some(folder.trim())
        .filter(|f| !f.is_empty())
        .map(PathBuf::from);

    config::save_config(&cfg)?;
    println!("\nSettings saved.");
    Ok(())
}
