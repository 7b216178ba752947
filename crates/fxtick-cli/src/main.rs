//! fxtick: run a script and pump its scheduler in real time

mod config;

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use fxtick_core::{Clock, MonotonicClock};
use fxtick_js::ScriptRuntime;
use tracing_subscriber::EnvFilter;

use crate::config::PumpConfig;

#[derive(Debug, Parser)]
#[command(name = "fxtick", version, about = "Run a script under a host-driven tick loop")]
struct Args {
    /// Script to evaluate before the first tick
    script: PathBuf,

    /// Number of ticks to run
    #[arg(long)]
    frames: Option<u64>,

    /// Milliseconds between ticks
    #[arg(long)]
    frame_ms: Option<u64>,

    /// JSON pump configuration
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PumpConfig::load(path)?,
        None => PumpConfig::default(),
    };
    if let Some(frames) = args.frames {
        config.frames = frames;
    }
    if let Some(frame_ms) = args.frame_ms {
        config.frame_ms = frame_ms;
    }

    let source = std::fs::read_to_string(&args.script)
        .with_context(|| format!("failed to read script {}", args.script.display()))?;

    tracing::info!("fxtick v{} (core v{})", env!("CARGO_PKG_VERSION"), fxtick_core::VERSION);

    let clock = MonotonicClock::new();
    let runtime = ScriptRuntime::with_clock(config.runtime.clone(), &clock)?;
    runtime
        .exec(&source)
        .with_context(|| format!("script {} failed", args.script.display()))?;

    let period = Duration::from_millis(config.frame_ms);
    let mut failures = 0;
    for _ in 0..config.frames {
        let report = runtime.tick(clock.now());
        failures += report.failures;
        thread::sleep(period);
    }

    let stats = runtime.stats();
    tracing::info!(
        ticks = stats.ticks,
        idle_ticks = stats.idle_ticks,
        table_scans = stats.table_scans,
        active_timers = stats.active_timers,
        active_tickers = stats.active_tickers,
        queued_frames = stats.queued_frames,
        failures,
        "Pump finished"
    );

    Ok(())
}
