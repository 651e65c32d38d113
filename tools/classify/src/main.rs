/// Batch classification of any delimited table carrying the nine model
/// feature columns. Input columns are passed through; prediction columns are
/// appended.
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use heatrisk_core::config::AppConfig;
use heatrisk_core::data::FeatureTable;
use heatrisk_core::model::{load_model, most_likely, ModelSource};
use heatrisk_core::risk::RiskClass;

#[derive(Parser, Debug)]
#[command(name = "classify", about = "Append heat-risk predictions to a feature table")]
struct Args {
    /// Input CSV with a header row
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON config overriding default asset paths
    #[arg(long)]
    config: Option<PathBuf>,

    /// Forest model JSON (overrides config)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Use the heat-index threshold classifier instead of a model file
    #[arg(long)]
    rules: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = AppConfig::load_or_default(args.config.as_deref()).context("Failed to load config")?;
    if let Some(p) = args.model {
        config.assets.model = p;
    }
    let source = if args.rules {
        ModelSource::Rules
    } else {
        ModelSource::forest(&config.assets.model)
    };

    let table = FeatureTable::load(&args.input)
        .with_context(|| format!("Cannot load {}", args.input.display()))?;
    let matrix = table.feature_matrix().context("Feature table rejected")?;
    let model = load_model(&source).context("Failed to load model")?;
    let probs = model.predict_probability(&matrix)?;

    let sink: Box<dyn io::Write> = match &args.output {
        Some(path) => Box::new(
            std::fs::File::create(path).with_context(|| format!("Cannot create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = csv::Writer::from_writer(sink);

    let mut header = table.headers.clone();
    header.extend(["predicted_risk", "risk_label"].map(String::from));
    header.extend(RiskClass::ALL.iter().map(|c| format!("p_{}", c.label().to_lowercase())));
    out.write_record(&header)?;

    let mut counts = [0usize; RiskClass::COUNT];
    for (row, p) in table.rows.iter().zip(&probs) {
        let risk = most_likely(p);
        counts[risk.index()] += 1;
        let mut record = row.cells.clone();
        record.push(risk.index().to_string());
        record.push(risk.label().to_string());
        record.extend(p.iter().map(|v| format!("{v:.4}")));
        out.write_record(&record)?;
    }
    out.flush()?;

    log::info!(
        "Classified {} rows with {}: {}",
        table.len(),
        model.name(),
        RiskClass::ALL
            .iter()
            .map(|c| format!("{}={}", c.label(), counts[c.index()]))
            .collect::<Vec<_>>()
            .join(" ")
    );
    Ok(())
}
