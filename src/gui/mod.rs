mod app;

use anyhow::{anyhow, Result};

use crate::config::Config;

pub fn launch(config: Config) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([820.0, 560.0])
            .with_min_inner_size([700.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "MP3Party Downloader",
        options,
        Box::new(move |cc| Ok(Box::new(app::DownloaderApp::new(cc, config)?))),
    )
    .map_err(|e| anyhow!("window failed: {e}"))
}
