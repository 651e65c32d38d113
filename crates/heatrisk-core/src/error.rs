//! Error taxonomy shared by every loader, the simulator and the live path.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required input file (model, map, baseline, ...) does not exist.
    #[error("missing asset: {}", path.display())]
    MissingAsset { path: PathBuf },

    /// A feature column required by the classifier is absent.
    #[error("missing feature: {0}")]
    MissingFeature(String),

    /// Live weather fetch failed: network, timeout, bad status or malformed payload.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// A loader's required (non-feature) column is absent from the header.
    #[error("{source_name}: missing column {column}")]
    MissingColumn { source_name: String, column: String },

    #[error("unknown district: {0}")]
    UnknownDistrict(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("invalid data in {source_name} (line {line}): {message}")]
    InvalidData {
        source_name: String,
        line: u64,
        message: String,
    },

    #[error("invalid scenario parameters: {0}")]
    InvalidParams(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("series length mismatch: {left} temperatures vs {right} humidities")]
    LengthMismatch { left: usize, right: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Only connectivity failures are transient; everything else is fatal to
    /// the current view or prediction call.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Connectivity(_))
    }

    pub(crate) fn invalid_data(source_name: &str, line: u64, message: impl Into<String>) -> Self {
        Error::InvalidData {
            source_name: source_name.to_string(),
            line,
            message: message.into(),
        }
    }
}

/// Fail with [`Error::MissingAsset`] when `path` does not exist.
pub(crate) fn require_asset(path: &std::path::Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(Error::MissingAsset { path: path.to_path_buf() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_connectivity_is_recoverable() {
        assert!(Error::Connectivity("timed out".into()).is_recoverable());
        assert!(!Error::MissingFeature("temp_c".into()).is_recoverable());
        assert!(!Error::MissingAsset { path: "models/x.json".into() }.is_recoverable());
    }

    #[test]
    fn missing_feature_names_the_column() {
        let msg = Error::MissingFeature("hi_max_72h".into()).to_string();
        assert_eq!(msg, "missing feature: hi_max_72h");
    }

    #[test]
    fn require_asset_reports_path() {
        let err = require_asset(std::path::Path::new("no/such/file.csv")).unwrap_err();
        assert!(matches!(err, Error::MissingAsset { .. }));
        assert!(err.to_string().contains("no/such/file.csv"));
    }
}
