//! Scenario simulation: perturb the baseline, rederive features, classify.
//!
//! Pipeline per baseline row of the selected month:
//!   1. temperature += Δt; humidity = clamp(humidity + Δrh, 0, 100);
//!      population *= 1 + Δpop/100
//!   2. heat index recomputed from the perturbed temperature / humidity
//!   3. 24 h rolling temperature shifted by Δt (sustained warming)
//!   4. 72 h rolling max = max(previous, new heat index)
//!   5. lag risk approximated by bucketing the new heat index
//!   6. features assembled and classified in one batch
//!
//! Step 5 stands in for a one-step feedback feature that would need a second
//! forward pass to compute properly.

use serde::{Deserialize, Serialize};

use crate::data::baseline::BaselineRecord;
use crate::error::{Error, Result};
use crate::features::{log_population, FeatureMatrix, FeatureRecord, RawFeatures};
use crate::heat_index::heat_index;
use crate::model::{most_likely, ClassProbabilities, RiskModel};
use crate::risk::RiskClass;

/// Extreme-district count above which the advisory is Critical.
pub const CRITICAL_DISTRICT_LIMIT: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParams {
    pub month: u8,
    /// Additive temperature change, °C (typically 0–5).
    pub delta_temp_c: f64,
    /// Additive humidity change, percentage points (typically −20–20).
    pub delta_humidity_pct: f64,
    /// Population growth, percent (typically 0–50).
    pub delta_population_pct: f64,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            month: 6,
            delta_temp_c: 0.0,
            delta_humidity_pct: 0.0,
            delta_population_pct: 0.0,
        }
    }
}

impl ScenarioParams {
    pub fn validate(&self) -> Result<()> {
        let deltas = [
            ("delta_temp_c", self.delta_temp_c),
            ("delta_humidity_pct", self.delta_humidity_pct),
            ("delta_population_pct", self.delta_population_pct),
        ];
        if let Some((name, v)) = deltas.iter().find(|(_, v)| !v.is_finite()) {
            return Err(Error::InvalidParams(format!("{name} is not finite: {v}")));
        }
        if self.delta_population_pct < -100.0 {
            return Err(Error::InvalidParams(format!(
                "population change {}% would make population negative",
                self.delta_population_pct
            )));
        }
        Ok(())
    }
}

/// One baseline row after perturbation, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Perturbed {
    pub district_name: String,
    pub month: u8,
    pub heat_index_c: f64,
    pub features: RawFeatures,
}

/// Non-decreasing update of the 72 h rolling max.
#[inline]
pub fn update_rolling_max(previous: f64, new_heat_index: f64) -> f64 {
    previous.max(new_heat_index)
}

pub fn perturb(record: &BaselineRecord, params: &ScenarioParams) -> Perturbed {
    let temp_c = record.temp_c + params.delta_temp_c;
    let humidity = (record.humidity + params.delta_humidity_pct).clamp(0.0, 100.0);
    let population = record.population * (1.0 + params.delta_population_pct / 100.0);

    let hi = heat_index(temp_c, humidity);

    Perturbed {
        district_name: record.district_name.clone(),
        month: record.month,
        heat_index_c: hi,
        features: RawFeatures {
            population,
            temp_c,
            humidity,
            wind_m_s: record.wind_m_s,
            solar_w_m2: record.solar_w_m2,
            temp_roll_24h: record.temp_roll_24h + params.delta_temp_c,
            hi_max_72h: update_rolling_max(record.hi_max_72h, hi),
            lag_risk: RiskClass::from_heat_index(hi),
        },
    }
}

// ── Output ───────────────────────────────────────────────────────────────────

/// A baseline row augmented with the recomputed heat index and prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioRow {
    pub district_name: String,
    pub month: u8,
    pub population: f64,
    pub pop_log: f64,
    pub temp_c: f64,
    pub humidity: f64,
    pub wind_m_s: f64,
    pub solar_w_m2: f64,
    pub temp_roll_24h: f64,
    pub hi_max_72h: f64,
    pub risk_lag: RiskClass,
    pub heat_index_c: f64,
    pub predicted_risk: RiskClass,
    pub risk_label: &'static str,
    pub probabilities: ClassProbabilities,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    Nominal,
    Warning,
    Critical,
}

impl Advisory {
    pub fn from_critical_count(n: usize) -> Self {
        if n > CRITICAL_DISTRICT_LIMIT {
            Advisory::Critical
        } else if n > 0 {
            Advisory::Warning
        } else {
            Advisory::Nominal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub districts: usize,
    pub class_counts: [usize; RiskClass::COUNT],
    /// Population in districts at Danger or above.
    pub population_at_risk: f64,
    /// Districts at Extreme.
    pub critical_districts: usize,
    pub mean_heat_index_c: Option<f64>,
    pub advisory: Advisory,
}

impl ScenarioSummary {
    pub fn from_rows(rows: &[ScenarioRow]) -> Self {
        let mut class_counts = [0usize; RiskClass::COUNT];
        let mut population_at_risk = 0.0;
        let mut hi_sum = 0.0;
        for r in rows {
            class_counts[r.predicted_risk.index()] += 1;
            if r.predicted_risk >= RiskClass::Danger {
                population_at_risk += r.population;
            }
            hi_sum += r.heat_index_c;
        }
        let critical_districts = class_counts[RiskClass::Extreme.index()];
        Self {
            districts: rows.len(),
            class_counts,
            population_at_risk,
            critical_districts,
            mean_heat_index_c: (!rows.is_empty()).then(|| hi_sum / rows.len() as f64),
            advisory: Advisory::from_critical_count(critical_districts),
        }
    }

    /// Districts classified at `class` or above.
    pub fn at_or_above(&self, class: RiskClass) -> usize {
        self.class_counts[class.index()..].iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    pub params: ScenarioParams,
    pub rows: Vec<ScenarioRow>,
    pub summary: ScenarioSummary,
}

// ── Simulation ───────────────────────────────────────────────────────────────

/// Run one scenario. A month absent from the baseline gives an empty result;
/// classifier failures propagate.
pub fn simulate(
    baseline: &[BaselineRecord],
    params: &ScenarioParams,
    model: &dyn RiskModel,
) -> Result<ScenarioResult> {
    params.validate()?;

    let perturbed: Vec<Perturbed> = baseline
        .iter()
        .filter(|r| r.month == params.month)
        .map(|r| perturb(r, params))
        .collect();

    let rows = if perturbed.is_empty() {
        log::warn!("No baseline rows for month {}", params.month);
        Vec::new()
    } else {
        classify(perturbed, model)?
    };

    let summary = ScenarioSummary::from_rows(&rows);
    log::info!(
        "Scenario month={} Δt={:+.1}°C Δrh={:+.0}% Δpop={:+.0}%: {} districts, {} extreme, {:?}",
        params.month,
        params.delta_temp_c,
        params.delta_humidity_pct,
        params.delta_population_pct,
        summary.districts,
        summary.critical_districts,
        summary.advisory,
    );

    Ok(ScenarioResult { params: *params, rows, summary })
}

fn classify(perturbed: Vec<Perturbed>, model: &dyn RiskModel) -> Result<Vec<ScenarioRow>> {
    let records: Vec<FeatureRecord> = perturbed.iter().map(|p| p.features.to_record()).collect();
    let matrix = FeatureMatrix::from_records(&records)?;
    let probs = model.predict_probability(&matrix)?;
    if probs.len() != perturbed.len() {
        return Err(Error::Model(format!(
            "{} returned {} probability rows for {} inputs",
            model.name(),
            probs.len(),
            perturbed.len()
        )));
    }

    Ok(perturbed
        .into_iter()
        .zip(probs)
        .map(|(p, probabilities)| {
            let risk = most_likely(&probabilities);
            let f = p.features;
            ScenarioRow {
                district_name: p.district_name,
                month: p.month,
                population: f.population,
                pop_log: log_population(f.population),
                temp_c: f.temp_c,
                humidity: f.humidity,
                wind_m_s: f.wind_m_s,
                solar_w_m2: f.solar_w_m2,
                temp_roll_24h: f.temp_roll_24h,
                hi_max_72h: f.hi_max_72h,
                risk_lag: f.lag_risk,
                heat_index_c: p.heat_index_c,
                predicted_risk: risk,
                risk_label: risk.label(),
                probabilities,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HeatIndexRules;
    use approx::assert_abs_diff_eq;

    fn record(name: &str, month: u8, temp_c: f64, humidity: f64, population: f64) -> BaselineRecord {
        BaselineRecord {
            district_name: name.to_string(),
            month,
            population,
            temp_c,
            humidity,
            wind_m_s: 3.0,
            solar_w_m2: 600.0,
            temp_roll_24h: temp_c - 0.5,
            hi_max_72h: heat_index(temp_c, humidity),
        }
    }

    fn baseline() -> Vec<BaselineRecord> {
        vec![
            record("Jacobabad", 6, 38.0, 25.0, 200_000.0),
            record("Karachi", 6, 33.0, 70.0, 16_000_000.0),
            record("Lahore", 6, 34.0, 45.0, 11_000_000.0),
            record("Quetta", 6, 26.0, 20.0, 1_000_000.0),
            record("Skardu", 6, 18.0, 40.0, 300_000.0),
            record("Sukkur", 6, 36.0, 35.0, 1_500_000.0),
            record("Lahore", 1, 12.0, 70.0, 11_000_000.0),
        ]
    }

    fn params(month: u8, dt: f64, drh: f64, dpop: f64) -> ScenarioParams {
        ScenarioParams {
            month,
            delta_temp_c: dt,
            delta_humidity_pct: drh,
            delta_population_pct: dpop,
        }
    }

    #[test]
    fn humidity_is_clamped_to_100() {
        let r = record("Karachi", 6, 30.0, 90.0, 1.0e6);
        let p = perturb(&r, &params(6, 0.0, 30.0, 0.0));
        assert_eq!(p.features.humidity, 100.0);

        let p = perturb(&r, &params(6, 0.0, -120.0, 0.0));
        assert_eq!(p.features.humidity, 0.0);
    }

    #[test]
    fn rolling_max_update_is_idempotent_and_monotone() {
        for (prev, new) in [(40.0, 42.8), (45.0, 42.8), (30.0, 30.0)] {
            let once = update_rolling_max(prev, new);
            assert_eq!(update_rolling_max(once, new), once);
            assert!(once >= prev);
        }
    }

    #[test]
    fn perturbation_shifts_rolling_temperature_and_population() {
        let r = record("Lahore", 6, 34.0, 45.0, 1_000_000.0);
        let p = perturb(&r, &params(6, 2.0, 0.0, 10.0));
        assert_abs_diff_eq!(p.features.temp_roll_24h, r.temp_roll_24h + 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.features.population, 1_100_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.features.vector()[1], log_population(1_100_000.0), epsilon = 1e-12);
        assert_eq!(p.features.lag_risk, RiskClass::from_heat_index(p.heat_index_c));
    }

    #[test]
    fn jacobabad_warming_end_to_end() {
        let base = vec![record("Jacobabad", 6, 38.0, 25.0, 200_000.0)];
        let result = simulate(&base, &params(6, 3.0, 0.0, 0.0), &HeatIndexRules).unwrap();
        let row = &result.rows[0];

        assert_abs_diff_eq!(row.temp_c, 41.0, epsilon = 1e-12);
        // Full regression branch: the simple estimate is above 80 °F.
        let t_f = crate::heat_index::celsius_to_fahrenheit(41.0);
        assert!(crate::heat_index::simple_estimate_f(t_f, 25.0) > 80.0);
        assert_abs_diff_eq!(row.heat_index_c, 42.796, epsilon = 1e-2);
        assert!(row.predicted_risk >= RiskClass::Danger);
        assert_eq!(row.risk_lag, RiskClass::Extreme);
        assert_eq!(row.risk_label, row.predicted_risk.label());
    }

    #[test]
    fn warming_never_reduces_districts_at_danger_or_above() {
        let base = baseline();
        let mut prev = 0usize;
        for step in 0..=10 {
            let dt = step as f64 * 0.5;
            let result = simulate(&base, &params(6, dt, 0.0, 0.0), &HeatIndexRules).unwrap();
            let n = result.summary.at_or_above(RiskClass::Danger);
            assert!(n >= prev, "Δt={dt}: {n} districts at ≥ Danger, was {prev}");
            prev = n;
        }
    }

    #[test]
    fn missing_month_yields_empty_result() {
        let result = simulate(&baseline(), &params(11, 2.0, 0.0, 0.0), &HeatIndexRules).unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(result.summary.districts, 0);
        assert_eq!(result.summary.mean_heat_index_c, None);
        assert_eq!(result.summary.advisory, Advisory::Nominal);
    }

    #[test]
    fn only_selected_month_is_simulated() {
        let result = simulate(&baseline(), &params(1, 0.0, 0.0, 0.0), &HeatIndexRules).unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].district_name, "Lahore");
    }

    #[test]
    fn summary_counts_population_at_risk() {
        let result = simulate(&baseline(), &params(6, 0.0, 0.0, 0.0), &HeatIndexRules).unwrap();
        let expected: f64 = result
            .rows
            .iter()
            .filter(|r| r.predicted_risk >= RiskClass::Danger)
            .map(|r| r.population)
            .sum();
        assert_eq!(result.summary.population_at_risk, expected);
        assert_eq!(result.summary.class_counts.iter().sum::<usize>(), result.rows.len());
    }

    #[test]
    fn advisory_thresholds() {
        assert_eq!(Advisory::from_critical_count(0), Advisory::Nominal);
        assert_eq!(Advisory::from_critical_count(1), Advisory::Warning);
        assert_eq!(Advisory::from_critical_count(25), Advisory::Warning);
        assert_eq!(Advisory::from_critical_count(26), Advisory::Critical);
    }

    #[test]
    fn invalid_params_are_rejected() {
        assert!(matches!(
            simulate(&baseline(), &params(6, f64::NAN, 0.0, 0.0), &HeatIndexRules),
            Err(Error::InvalidParams(_))
        ));
        assert!(matches!(
            simulate(&baseline(), &params(6, 0.0, 0.0, -150.0), &HeatIndexRules),
            Err(Error::InvalidParams(_))
        ));
    }

    struct FailingModel;

    impl RiskModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }
        fn predict(&self, _: &FeatureMatrix) -> Result<Vec<RiskClass>> {
            Err(Error::Model("backend unavailable".into()))
        }
        fn predict_probability(&self, _: &FeatureMatrix) -> Result<Vec<ClassProbabilities>> {
            Err(Error::Model("backend unavailable".into()))
        }
    }

    /// Serves probabilities only; class predictions must be derived from them.
    struct ProbabilityOnly;

    impl RiskModel for ProbabilityOnly {
        fn name(&self) -> &str {
            "probability-only"
        }
        fn predict(&self, _: &FeatureMatrix) -> Result<Vec<RiskClass>> {
            Err(Error::Model("predict called separately".into()))
        }
        fn predict_probability(&self, m: &FeatureMatrix) -> Result<Vec<ClassProbabilities>> {
            Ok(vec![[0.1, 0.2, 0.6, 0.1]; m.len()])
        }
    }

    #[test]
    fn classes_derive_from_a_single_probability_pass() {
        let result = simulate(&baseline(), &params(6, 1.0, 0.0, 0.0), &ProbabilityOnly).unwrap();
        assert_eq!(result.rows.len(), 6);
        assert!(result.rows.iter().all(|r| r.predicted_risk == RiskClass::Danger));
        assert_eq!(result.rows[0].probabilities, [0.1, 0.2, 0.6, 0.1]);
    }

    #[test]
    fn classifier_failure_propagates() {
        let err = simulate(&baseline(), &params(6, 1.0, 0.0, 0.0), &FailingModel).unwrap_err();
        assert!(matches!(err, Error::Model(_)));
    }
}
