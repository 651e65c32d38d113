//! Asset locations and live-fetch settings.
//!
//! Defaults match the on-disk layout produced by the data-preparation
//! scripts. A JSON file may override any subset of fields.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{require_asset, Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub assets: AssetPaths,
    pub live: LiveConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub model: PathBuf,
    pub district_map: PathBuf,
    pub baseline: PathBuf,
    pub coords: PathBuf,
    pub history: PathBuf,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            model: "models/heat_risk_model.json".into(),
            district_map: "app/data/pakistan_districts.geojson".into(),
            baseline: "app/data/app_baseline.csv".into(),
            coords: "app/data/district_coords.csv".into(),
            history: "app/data/app_history_2015.csv".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Forecast endpoint; queried with `latitude`, `longitude` and `current`.
    pub endpoint: String,
    /// Whole-request timeout in seconds. One attempt, no retries.
    pub timeout_secs: u64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.open-meteo.com/v1/forecast".to_string(),
            timeout_secs: 5,
        }
    }
}

impl LiveConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// A zero timeout would fail every fetch before it starts.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(Error::InvalidConfig("live.timeout_secs must be at least 1".into()));
        }
        Ok(())
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        require_asset(path)?;
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.live.validate()?;
        Ok(config)
    }

    /// Defaults when no file is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heatrisk.json");
        fs::write(&path, r#"{ "assets": { "baseline": "data/b.csv" }, "live": { "timeout_secs": 3 } }"#)
            .unwrap();
        let cfg = AppConfig::load(&path).unwrap();
        assert_eq!(cfg.assets.baseline, PathBuf::from("data/b.csv"));
        assert_eq!(cfg.assets.model, AssetPaths::default().model);
        assert_eq!(cfg.live.timeout(), Duration::from_secs(3));
        assert_eq!(cfg.live.endpoint, LiveConfig::default().endpoint);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heatrisk.json");
        fs::write(&path, r#"{ "live": { "timeout_secs": 0 } }"#).unwrap();
        assert!(matches!(AppConfig::load(&path), Err(Error::InvalidConfig(_))));
        assert!(LiveConfig { timeout_secs: 0, ..LiveConfig::default() }.validate().is_err());
        assert!(LiveConfig::default().validate().is_ok());
    }

    #[test]
    fn no_path_gives_defaults() {
        assert_eq!(AppConfig::load_or_default(None).unwrap(), AppConfig::default());
    }

    #[test]
    fn absent_file_is_missing_asset() {
        let err = AppConfig::load(Path::new("nope/heatrisk.json")).unwrap_err();
        assert!(matches!(err, crate::error::Error::MissingAsset { .. }));
    }
}
