//! Loaded assets and per-session result state.
//!
//! [`Assets`] is loaded once and never mutated, so one `Arc<Assets>` can back
//! any number of sessions. A [`Session`] keeps only the most recent scenario
//! and live results; a new result replaces the old one wholesale, and a
//! failed request leaves the previous result in place.

use std::sync::Arc;

use crate::config::AssetPaths;
use crate::data::baseline::BaselineTable;
use crate::data::coords::CoordinateTable;
use crate::data::geo::{DistrictMap, JoinReport};
use crate::error::{Error, Result};
use crate::live::{assess_live, LiveAssessment, WeatherSource};
use crate::model::{load_model, ModelSource, RiskModel};
use crate::scenario::{simulate, ScenarioParams, ScenarioResult};

pub struct Assets {
    pub paths: AssetPaths,
    pub model: Box<dyn RiskModel>,
    pub baseline: BaselineTable,
    pub coords: Option<CoordinateTable>,
    pub map: Option<DistrictMap>,
}

impl Assets {
    /// Load the model and baseline (required) plus coordinates and map
    /// (optional: absence only disables the live and map views).
    pub fn load(paths: &AssetPaths, model: &ModelSource) -> Result<Self> {
        let model = load_model(model)?;
        let baseline = BaselineTable::load(&paths.baseline)?;
        let coords = optional(CoordinateTable::load(&paths.coords))?;
        let map = optional(DistrictMap::load(&paths.district_map))?;
        Ok(Self { paths: paths.clone(), model, baseline, coords, map })
    }
}

fn optional<T>(loaded: Result<T>) -> Result<Option<T>> {
    match loaded {
        Ok(v) => Ok(Some(v)),
        Err(Error::MissingAsset { path }) => {
            log::warn!("Optional asset {} not found", path.display());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

pub struct Session {
    assets: Arc<Assets>,
    last_scenario: Option<ScenarioResult>,
    last_live: Option<LiveAssessment>,
}

impl Session {
    pub fn new(assets: Arc<Assets>) -> Self {
        Self { assets, last_scenario: None, last_live: None }
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub fn last_scenario(&self) -> Option<&ScenarioResult> {
        self.last_scenario.as_ref()
    }

    pub fn last_live(&self) -> Option<&LiveAssessment> {
        self.last_live.as_ref()
    }

    pub fn run_scenario(&mut self, params: &ScenarioParams) -> Result<&ScenarioResult> {
        let result = simulate(self.assets.baseline.records(), params, self.assets.model.as_ref())?;
        Ok(self.last_scenario.insert(result))
    }

    pub fn run_live(&mut self, district: &str, source: &dyn WeatherSource) -> Result<&LiveAssessment> {
        let coords = self.assets.coords.as_ref().ok_or_else(|| Error::MissingAsset {
            path: self.assets.paths.coords.clone(),
        })?;
        let assessment =
            assess_live(district, coords, &self.assets.baseline, source, self.assets.model.as_ref())?;
        Ok(self.last_live.insert(assessment))
    }

    /// Annotated map for the most recent scenario, if both exist.
    pub fn scenario_map(&self) -> Option<(serde_json::Value, JoinReport)> {
        let map = self.assets.map.as_ref()?;
        let result = self.last_scenario.as_ref()?;
        Some(map.annotate(&result.rows))
    }
}
