//! Live single-point classification.
//!
//! One blocking request with a bounded timeout, no retries. Any transport
//! failure, non-success status or payload missing an expected field is a
//! [`Error::Connectivity`], which callers treat as recoverable.
//!
//! With no observation history available, the current reading stands in for
//! its own 24 h rolling mean, the current heat index for its own 72 h rolling
//! max, and the lag risk is Safe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::LiveConfig;
use crate::data::baseline::BaselineTable;
use crate::data::coords::{CoordinateTable, Coordinates};
use crate::error::{Error, Result};
use crate::features::{FeatureMatrix, RawFeatures};
use crate::heat_index::heat_index;
use crate::model::{most_likely, ClassProbabilities, RiskModel};
use crate::names::canonical_district_name;
use crate::risk::RiskClass;

pub const KMH_PER_MS: f64 = 3.6;

/// Current conditions as reported by the weather source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveReading {
    pub temperature_c: f64,
    pub relative_humidity: f64,
    /// As reported, km/h. Converted by the caller.
    pub wind_speed_km_h: f64,
    pub direct_radiation_w_m2: f64,
}

/// Source of current weather for a point.
pub trait WeatherSource {
    fn current(&self, at: Coordinates) -> Result<LiveReading>;
}

// ── Open-Meteo ───────────────────────────────────────────────────────────────

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,direct_radiation";

#[derive(Deserialize)]
struct ForecastResponse {
    current: Option<CurrentBlock>,
}

#[derive(Deserialize)]
struct CurrentBlock {
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    wind_speed_10m: Option<f64>,
    direct_radiation: Option<f64>,
}

fn field(v: Option<f64>, name: &str) -> Result<f64> {
    v.ok_or_else(|| Error::Connectivity(format!("response missing current.{name}")))
}

/// Parse an Open-Meteo forecast body carrying a `current` block.
pub fn parse_open_meteo(body: &str) -> Result<LiveReading> {
    let resp: ForecastResponse = serde_json::from_str(body)
        .map_err(|e| Error::Connectivity(format!("malformed response: {e}")))?;
    let cur = resp
        .current
        .ok_or_else(|| Error::Connectivity("response missing current block".into()))?;
    Ok(LiveReading {
        temperature_c: field(cur.temperature_2m, "temperature_2m")?,
        relative_humidity: field(cur.relative_humidity_2m, "relative_humidity_2m")?,
        wind_speed_km_h: field(cur.wind_speed_10m, "wind_speed_10m")?,
        direct_radiation_w_m2: field(cur.direct_radiation, "direct_radiation")?,
    })
}

pub struct OpenMeteoClient {
    agent: ureq::Agent,
    endpoint: String,
}

impl OpenMeteoClient {
    pub fn new(config: &LiveConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout()).build();
        Self { agent, endpoint: config.endpoint.clone() }
    }
}

impl WeatherSource for OpenMeteoClient {
    fn current(&self, at: Coordinates) -> Result<LiveReading> {
        let response = self
            .agent
            .get(&self.endpoint)
            .query("latitude", &at.lat.to_string())
            .query("longitude", &at.lon.to_string())
            .query("current", CURRENT_FIELDS)
            .call();

        match response {
            Ok(resp) => {
                let body = resp
                    .into_string()
                    .map_err(|e| Error::Connectivity(format!("reading response: {e}")))?;
                parse_open_meteo(&body)
            }
            Err(ureq::Error::Status(code, _)) => {
                Err(Error::Connectivity(format!("weather service returned HTTP {code}")))
            }
            Err(e) => Err(Error::Connectivity(e.to_string())),
        }
    }
}

// ── Assessment ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveAssessment {
    pub district_name: String,
    pub coordinates: Coordinates,
    pub observed_at: DateTime<Utc>,
    pub reading: LiveReading,
    pub wind_m_s: f64,
    pub heat_index_c: f64,
    pub risk: RiskClass,
    pub risk_label: &'static str,
    pub probabilities: ClassProbabilities,
}

/// Cold-start feature row for a single reading.
pub fn cold_start_features(reading: &LiveReading, population: f64) -> RawFeatures {
    let hi = heat_index(reading.temperature_c, reading.relative_humidity);
    RawFeatures {
        population,
        temp_c: reading.temperature_c,
        humidity: reading.relative_humidity,
        wind_m_s: reading.wind_speed_km_h / KMH_PER_MS,
        solar_w_m2: reading.direct_radiation_w_m2,
        temp_roll_24h: reading.temperature_c,
        hi_max_72h: hi,
        lag_risk: RiskClass::Safe,
    }
}

/// Fetch current weather for `district` and classify it.
pub fn assess_live(
    district: &str,
    coords: &CoordinateTable,
    baseline: &BaselineTable,
    source: &dyn WeatherSource,
    model: &dyn RiskModel,
) -> Result<LiveAssessment> {
    let name = canonical_district_name(district);
    let at = coords.get(&name).ok_or_else(|| Error::UnknownDistrict(name.clone()))?;
    let population = baseline
        .population_of(&name)
        .ok_or_else(|| Error::UnknownDistrict(name.clone()))?;

    let reading = source.current(at).map_err(|e| {
        log::warn!("Live fetch for {name} failed: {e}");
        e
    })?;

    let raw = cold_start_features(&reading, population);
    let matrix = FeatureMatrix::from_records(&[raw.to_record()])?;
    let probabilities = model
        .predict_probability(&matrix)?
        .first()
        .copied()
        .ok_or_else(|| Error::Model(format!("{} returned no probabilities", model.name())))?;
    let risk = most_likely(&probabilities);

    log::info!(
        "Live {name}: {:.1}°C {:.0}% → HI {:.1}°C, {}",
        reading.temperature_c,
        reading.relative_humidity,
        raw.hi_max_72h,
        risk
    );

    Ok(LiveAssessment {
        district_name: name,
        coordinates: at,
        observed_at: Utc::now(),
        reading,
        wind_m_s: raw.wind_m_s,
        heat_index_c: raw.hi_max_72h,
        risk,
        risk_label: risk.label(),
        probabilities,
    })
}
