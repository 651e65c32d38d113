/// Historical replay: classify a timestamped history slice and write
/// fixed-interval animation frames as JSON.
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use heatrisk_core::config::AppConfig;
use heatrisk_core::data::HistoryTable;
use heatrisk_core::model::{load_model, ModelSource};
use heatrisk_core::replay::{build_frames, ReplayFrame, DEFAULT_INTERVAL_HOURS};
use heatrisk_core::risk::RiskClass;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "replay", about = "Build time-lapse frames from a historical heat slice")]
struct Args {
    /// JSON config overriding default asset paths
    #[arg(long)]
    config: Option<PathBuf>,

    /// History CSV (overrides config)
    #[arg(long)]
    history: Option<PathBuf>,

    /// Forest model JSON (overrides config)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Use the heat-index threshold classifier instead of a model file
    #[arg(long)]
    rules: bool,

    /// Frame width in hours, aligned to midnight
    #[arg(long, default_value_t = DEFAULT_INTERVAL_HOURS, value_parser = clap::value_parser!(u32).range(1..=24))]
    interval_hours: u32,

    /// Output frames JSON
    #[arg(short, long, default_value = "data/replay_frames.json")]
    output: PathBuf,
}

#[derive(Serialize)]
struct FramesFile<'a> {
    source: String,
    interval_hours: u32,
    frames: &'a [ReplayFrame],
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = AppConfig::load_or_default(args.config.as_deref()).context("Failed to load config")?;
    if let Some(p) = args.history {
        config.assets.history = p;
    }
    if let Some(p) = args.model {
        config.assets.model = p;
    }
    let source = if args.rules {
        ModelSource::Rules
    } else {
        ModelSource::forest(&config.assets.model)
    };

    let model = load_model(&source).context("Failed to load model")?;
    let history = HistoryTable::load(&config.assets.history)
        .with_context(|| format!("Cannot load history {}", config.assets.history.display()))?;
    let frames = build_frames(history.rows(), model.as_ref(), args.interval_hours)
        .context("Replay classification failed")?;

    // Peak frame by number of Extreme districts.
    let peak = frames.iter().max_by_key(|f| {
        f.cells.iter().filter(|c| c.predicted_risk == RiskClass::Extreme).count()
    });
    if let Some(f) = peak {
        let n = f.cells.iter().filter(|c| c.predicted_risk == RiskClass::Extreme).count();
        eprintln!("  peak frame {}: {} extreme of {} districts", f.label, n, f.cells.len());
    }

    if let Some(dir) = args.output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("Cannot create {}", dir.display()))?;
    }
    let file = FramesFile {
        source: config.assets.history.display().to_string(),
        interval_hours: args.interval_hours,
        frames: &frames,
    };
    fs::write(&args.output, serde_json::to_string(&file)?)
        .with_context(|| format!("Cannot write {}", args.output.display()))?;
    log::info!("Wrote {} frames to {}", frames.len(), args.output.display());
    Ok(())
}
