//! Classifier feature layout and assembly.
//!
//! The classifier was trained on exactly nine columns in the order of
//! [`FEATURE_COLUMNS`]. Changing the order or the names breaks every
//! serialised model, so this list is the single source of truth.
//!
//! Assembly never defaults a missing value: a row without one of the columns
//! fails with [`Error::MissingFeature`] before any model is invoked.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::risk::RiskClass;

pub const FEATURE_COUNT: usize = 9;

/// Feature names in the exact order the classifier expects.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "population_2020",   // 0: resident population
    "pop_log",           // 1: log10(population + 1)
    "temp_c",            // 2: air temperature, °C
    "humidity_relative", // 3: relative humidity, %
    "wind_speed_m_s",    // 4: wind speed, m/s
    "solar_w_m2",        // 5: solar irradiance, W/m²
    "temp_roll_24h",     // 6: 24 h rolling mean temperature, °C
    "hi_max_72h",        // 7: 72 h rolling max heat index, °C
    "risk_lag_1h",       // 8: risk class one step earlier (0–3)
];

/// Index of `hi_max_72h` in a [`FeatureVector`].
pub const HI_MAX_72H: usize = 7;

pub type FeatureVector = [f64; FEATURE_COUNT];

#[inline]
pub fn log_population(population: f64) -> f64 {
    (population + 1.0).log10()
}

// ── Typed row ────────────────────────────────────────────────────────────────

/// Raw attributes of one observation before derivation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawFeatures {
    pub population: f64,
    pub temp_c: f64,
    pub humidity: f64,
    pub wind_m_s: f64,
    pub solar_w_m2: f64,
    pub temp_roll_24h: f64,
    pub hi_max_72h: f64,
    pub lag_risk: RiskClass,
}

impl RawFeatures {
    /// Named record with `pop_log` derived from `population`.
    pub fn to_record(&self) -> FeatureRecord {
        FeatureRecord::from_vector(&self.vector())
    }

    pub fn vector(&self) -> FeatureVector {
        [
            self.population,
            log_population(self.population),
            self.temp_c,
            self.humidity,
            self.wind_m_s,
            self.solar_w_m2,
            self.temp_roll_24h,
            self.hi_max_72h,
            self.lag_risk.index() as f64,
        ]
    }
}

// ── Named row ────────────────────────────────────────────────────────────────

/// A row of named numeric values, as read from a delimited table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRecord {
    values: BTreeMap<String, f64>,
}

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vector(v: &FeatureVector) -> Self {
        let values = FEATURE_COLUMNS
            .iter()
            .zip(v)
            .map(|(name, &x)| (name.to_string(), x))
            .collect();
        Self { values }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Like [`get`](Self::get) but a missing column is a schema error.
    pub fn require(&self, name: &str) -> Result<f64> {
        self.get(name).ok_or_else(|| Error::MissingFeature(name.to_string()))
    }

    /// Ordered feature vector; fails on the first missing column.
    pub fn assemble(&self) -> Result<FeatureVector> {
        let mut v = [0.0; FEATURE_COUNT];
        for (slot, name) in v.iter_mut().zip(FEATURE_COLUMNS) {
            *slot = self.require(name)?;
        }
        Ok(v)
    }
}

// ── Matrix ───────────────────────────────────────────────────────────────────

/// Validated, ordered rows ready for a classifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<FeatureVector>,
}

impl FeatureMatrix {
    pub fn from_records(records: &[FeatureRecord]) -> Result<Self> {
        let rows = records.iter().map(FeatureRecord::assemble).collect::<Result<Vec<_>>>()?;
        Ok(Self { rows })
    }

    pub fn from_raw(raw: &[RawFeatures]) -> Self {
        Self { rows: raw.iter().map(RawFeatures::vector).collect() }
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |r| r[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample_raw() -> RawFeatures {
        RawFeatures {
            population: 999.0,
            temp_c: 38.0,
            humidity: 25.0,
            wind_m_s: 3.2,
            solar_w_m2: 610.0,
            temp_roll_24h: 36.5,
            hi_max_72h: 40.1,
            lag_risk: RiskClass::Danger,
        }
    }

    #[test]
    fn vector_follows_layout_order() {
        let v = sample_raw().vector();
        assert_eq!(v[0], 999.0);
        assert_abs_diff_eq!(v[1], 3.0, epsilon = 1e-12);
        assert_eq!(v[2], 38.0);
        assert_eq!(v[3], 25.0);
        assert_eq!(v[4], 3.2);
        assert_eq!(v[5], 610.0);
        assert_eq!(v[6], 36.5);
        assert_eq!(v[HI_MAX_72H], 40.1);
        assert_eq!(v[8], 2.0);
    }

    #[test]
    fn record_round_trips_through_assembly() {
        let raw = sample_raw();
        assert_eq!(raw.to_record().assemble().unwrap(), raw.vector());
    }

    #[test]
    fn each_missing_column_is_named() {
        let full = sample_raw().to_record();
        for name in FEATURE_COLUMNS {
            let mut rec = full.clone();
            rec.remove(name);
            match rec.assemble() {
                Err(Error::MissingFeature(col)) => assert_eq!(col, name),
                other => panic!("dropping {name}: expected MissingFeature, got {other:?}"),
            }
        }
    }

    #[test]
    fn matrix_rejects_any_incomplete_row() {
        let good = sample_raw().to_record();
        let mut bad = good.clone();
        bad.remove("solar_w_m2");
        let err = FeatureMatrix::from_records(&[good, bad]).unwrap_err();
        assert!(matches!(err, Error::MissingFeature(ref c) if c == "solar_w_m2"));
    }

    #[test]
    fn extra_columns_are_ignored() {
        let mut rec = sample_raw().to_record();
        rec.insert("district_id", 17.0);
        assert_eq!(rec.assemble().unwrap(), sample_raw().vector());
    }

    #[test]
    fn zero_population_has_zero_log() {
        assert_eq!(log_population(0.0), 0.0);
    }
}
