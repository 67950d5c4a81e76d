//! Headless overview driver: opens a folder, loads its thumbnails and
//! reports the resulting canvas.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use web_time::Instant;

use hajimi::pipeline::ImageCrateCodec;
use hajimi::project::NativeFileSystem;
use hajimi::{Overview, OverviewConfig, OverviewError};

/// Poll interval, roughly one frame.
const FRAME: Duration = Duration::from_millis(16);

fn main() -> ExitCode {
    let config = OverviewConfig::load_from_default_path().unwrap_or_default();

    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();

    let Some(folder) = std::env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("Usage: hajimi-overview <folder>");
        return ExitCode::FAILURE;
    };

    match run(&config, &folder) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Failed to open {:?}: {}", folder, e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &OverviewConfig, folder: &Path) -> Result<(), OverviewError> {
    let mut overview =
        Overview::new(config, Box::new(NativeFileSystem), Arc::new(ImageCrateCodec))?;
    log::debug!("Using {} decoder threads", overview.decoder_threads());

    let shown = overview.open(folder)?;
    wait_until_loaded(&mut overview);

    // Give the camera time to settle so a small folder gets promoted
    std::thread::sleep(Duration::from_millis(config.tuning.settle_delay_ms) + FRAME);
    overview.tick(Instant::now());
    wait_until_loaded(&mut overview);

    let progress = overview.progress();
    let camera = overview.camera();
    let high_res = overview.items().iter().filter(|item| item.is_high_res()).count();
    let stats = overview.stats();

    println!("Folder:      {}", folder.display());
    println!("Images:      {} ({} shown)", overview.files().len(), shown);
    println!(
        "Thumbnails:  {} decoded, {} failed",
        progress.completed - progress.failed,
        progress.failed
    );
    println!("Full res:    {}", high_res);
    println!(
        "Camera:      zoom {:.3}, pan ({:.1}, {:.1})",
        camera.zoom(),
        camera.pan.x,
        camera.pan.y
    );
    println!("Visible:     {}", overview.visible_items().len());
    println!(
        "Review:      {} passed, {} failed, {} invalid, {} other, {} unreviewed",
        stats.passed, stats.failed, stats.invalid, stats.unrecognized, stats.unreviewed
    );
    Ok(())
}

fn wait_until_loaded(overview: &mut Overview) {
    while overview.is_loading() {
        overview.tick(Instant::now());
        std::thread::sleep(FRAME);
    }
    overview.tick(Instant::now());
}
