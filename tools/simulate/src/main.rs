/// Scenario simulator: perturb the baseline for one month, classify every
/// district and write the result (and optionally the annotated map).
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use heatrisk_core::config::AppConfig;
use heatrisk_core::model::ModelSource;
use heatrisk_core::risk::RiskClass;
use heatrisk_core::scenario::ScenarioParams;
use heatrisk_core::session::{Assets, Session};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "simulate", about = "Run a climate scenario over the district baseline")]
struct Args {
    /// JSON config overriding default asset paths
    #[arg(long)]
    config: Option<PathBuf>,

    /// Baseline CSV (overrides config)
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// Forest model JSON (overrides config)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Use the heat-index threshold classifier instead of a model file
    #[arg(long)]
    rules: bool,

    /// District boundary GeoJSON (overrides config)
    #[arg(long)]
    map: Option<PathBuf>,

    /// Calendar month, 1–12
    #[arg(long, default_value = "6", value_parser = clap::value_parser!(u8).range(1..=12))]
    month: u8,

    /// Temperature change, °C
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    delta_temp: f64,

    /// Relative humidity change, percentage points
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    delta_humidity: f64,

    /// Population change, percent
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    delta_pop: f64,

    /// Scenario result JSON
    #[arg(short, long, default_value = "data/scenario.json")]
    output: PathBuf,

    /// Annotated district GeoJSON (skipped when absent)
    #[arg(long)]
    map_output: Option<PathBuf>,
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("Cannot create {}", dir.display()))?;
    }
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).with_context(|| format!("Cannot write {}", path.display()))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = AppConfig::load_or_default(args.config.as_deref()).context("Failed to load config")?;
    if let Some(p) = args.baseline {
        config.assets.baseline = p;
    }
    if let Some(p) = args.model {
        config.assets.model = p;
    }
    if let Some(p) = args.map {
        config.assets.district_map = p;
    }
    let source = if args.rules {
        ModelSource::Rules
    } else {
        ModelSource::forest(&config.assets.model)
    };

    let assets = Assets::load(&config.assets, &source).context("Failed to load assets")?;
    let mut session = Session::new(Arc::new(assets));

    if let Some(ctx) = session.assets().baseline.month_context(args.month) {
        log::info!(
            "Month {} baseline: {} districts, mean {:.1}°C, {:.0}% RH",
            ctx.month,
            ctx.districts,
            ctx.mean_temp_c,
            ctx.mean_humidity
        );
    }

    let params = ScenarioParams {
        month: args.month,
        delta_temp_c: args.delta_temp,
        delta_humidity_pct: args.delta_humidity,
        delta_population_pct: args.delta_pop,
    };
    let result = session.run_scenario(&params).context("Scenario failed")?;

    let s = &result.summary;
    for class in RiskClass::ALL {
        eprintln!("  {:<8} {:>4}", class.label(), s.class_counts[class.index()]);
    }
    eprintln!(
        "  {} at Danger or above, population at risk {:.0}, advisory {:?}",
        s.at_or_above(RiskClass::Danger),
        s.population_at_risk,
        s.advisory
    );
    write_json(&args.output, result)?;

    if let Some(path) = args.map_output {
        match session.scenario_map() {
            Some((map, report)) => {
                log::info!(
                    "Map join: {} matched, {} without data, {} off-map",
                    report.matched,
                    report.unmatched_features.len(),
                    report.unmapped_districts.len()
                );
                write_json(&path, &map)?;
            }
            None => log::warn!("No district map loaded; skipping {}", path.display()),
        }
    }
    Ok(())
}
