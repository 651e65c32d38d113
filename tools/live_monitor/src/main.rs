/// Live single-point check: fetch current weather for one district and
/// classify it. A failed fetch is reported and exits non-zero; nothing else
/// is affected.
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use heatrisk_core::config::AppConfig;
use heatrisk_core::live::OpenMeteoClient;
use heatrisk_core::model::ModelSource;
use heatrisk_core::session::{Assets, Session};

/// Exit status when live data could not be fetched.
const EXIT_UNAVAILABLE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "live_monitor", about = "Classify current heat risk for one district")]
struct Args {
    /// District name (any casing; known aliases accepted)
    #[arg(short, long, required_unless_present = "list")]
    district: Option<String>,

    /// List districts with known coordinates and exit
    #[arg(long)]
    list: bool,

    /// JSON config overriding default asset paths and live settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// District coordinates CSV (overrides config)
    #[arg(long)]
    coords: Option<PathBuf>,

    /// Baseline CSV, used for district population (overrides config)
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// Forest model JSON (overrides config)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Use the heat-index threshold classifier instead of a model file
    #[arg(long)]
    rules: bool,

    /// Forecast endpoint (overrides config)
    #[arg(long)]
    endpoint: Option<String>,

    /// Request timeout in seconds (overrides config)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    /// Write the assessment as JSON here as well as printing it
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = AppConfig::load_or_default(args.config.as_deref()).context("Failed to load config")?;
    if let Some(p) = args.coords {
        config.assets.coords = p;
    }
    if let Some(p) = args.baseline {
        config.assets.baseline = p;
    }
    if let Some(p) = args.model {
        config.assets.model = p;
    }
    if let Some(e) = args.endpoint {
        config.live.endpoint = e;
    }
    if let Some(t) = args.timeout_secs {
        config.live.timeout_secs = t;
    }
    config.live.validate().context("Invalid live settings")?;
    let source = if args.rules {
        ModelSource::Rules
    } else {
        ModelSource::forest(&config.assets.model)
    };

    let assets = Assets::load(&config.assets, &source).context("Failed to load assets")?;
    if assets.coords.is_none() {
        bail!("District coordinates not available at {}", config.assets.coords.display());
    }

    if args.list {
        if let Some(coords) = &assets.coords {
            for name in coords.names() {
                println!("{name}");
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let Some(district) = args.district else {
        bail!("--district is required");
    };

    let client = OpenMeteoClient::new(&config.live);
    let mut session = Session::new(Arc::new(assets));
    let assessment = match session.run_live(&district, &client) {
        Ok(a) => a,
        Err(e) if e.is_recoverable() => {
            eprintln!("Live data unavailable for {district}: {e}");
            return Ok(ExitCode::from(EXIT_UNAVAILABLE));
        }
        Err(e) => return Err(e).with_context(|| format!("Live assessment for {district} failed")),
    };

    let r = &assessment.reading;
    println!("{} ({:.2}, {:.2})", assessment.district_name, assessment.coordinates.lat, assessment.coordinates.lon);
    println!("  observed    {}", assessment.observed_at.format("%Y-%m-%d %H:%M UTC"));
    println!("  temperature {:.1} °C", r.temperature_c);
    println!("  humidity    {:.0} %", r.relative_humidity);
    println!("  wind        {:.1} m/s", assessment.wind_m_s);
    println!("  radiation   {:.0} W/m²", r.direct_radiation_w_m2);
    println!("  heat index  {:.1} °C", assessment.heat_index_c);
    println!("  risk        {}", assessment.risk_label);

    if let Some(path) = args.output {
        let text = serde_json::to_string_pretty(assessment)?;
        fs::write(&path, text).with_context(|| format!("Cannot write {}", path.display()))?;
        log::info!("Wrote {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}
