//! tilecap-probe entry point.
//!
//! ```text
//! tilecap-probe                     Run with tilecap-probe.toml (or defaults)
//! tilecap-probe --config <path>     Load a custom config TOML
//! tilecap-probe --gen-config        Write default config to stdout
//! tilecap-probe --json              Print final diagnostics as JSON
//! tilecap-probe --record <path>     Append bincode batches to a file
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tilecap_probe::config::ProbeConfig;
use tilecap_probe::service::ProbeService;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tilecap-probe", about = "Tile-delta capture engine probe")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "tilecap-probe.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Print the final diagnostics as JSON.
    #[arg(long)]
    json: bool,

    /// Record batches to this file (overrides `run.record_path`).
    #[arg(long)]
    record: Option<PathBuf>,

    /// Override the tile size from the config.
    #[arg(long)]
    tile_size: Option<u32>,

    /// Override the capture rate from the config.
    #[arg(long)]
    fps: Option<u32>,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&ProbeConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    // Load config and apply overrides.
    let mut config = ProbeConfig::load(&cli.config);
    if let Some(path) = &cli.record {
        config.run.record_path = path.display().to_string();
    }
    if let Some(size) = cli.tile_size {
        config.capture.tile_size = size;
    }
    if let Some(fps) = cli.fps {
        config.capture.target_fps = fps;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let capture = config.capture_config();
    info!("tilecap-probe v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "overlay: {}x{}",
        config.source.width, config.source.height
    );
    info!("tile size: {}", capture.tile_size);
    info!("target FPS: {}", capture.target_fps);

    let mut service = ProbeService::new(config);
    let stop = service.stop_handle();

    // Ctrl-C handler.
    let stop_clone = stop.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received; shutting down");
        stop_clone.stop();
    });

    let report = service.run().await?;

    info!(
        "delivered {} batches from {} pulls ({} source failures)",
        report.delivered, report.pulls, report.failures
    );
    info!(
        "avg {:.3} ms/capture, {:.1}% dirty, {:.0} bytes; {} transparent tiles skipped, {} bytes saved",
        report.stats.avg_total_ms,
        report.stats.avg_dirty_percent,
        report.stats.avg_bytes,
        report.stats.lifetime_transparent_skipped,
        report.stats.lifetime_transparent_saved
    );
    info!("recommendation: {}", report.stats.recommendation);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.stats)?);
    }

    Ok(())
}
