//! Threshold classifier on the 72 h rolling-max heat index.
//!
//! Used as a reference backend and wherever no trained artifact is available.

use crate::error::Result;
use crate::features::{FeatureMatrix, HI_MAX_72H};
use crate::model::{ClassProbabilities, RiskModel};
use crate::risk::RiskClass;

#[derive(Debug, Clone, Copy, Default)]
pub struct HeatIndexRules;

impl RiskModel for HeatIndexRules {
    fn name(&self) -> &str {
        "heat-index-rules"
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<RiskClass>> {
        Ok(features.column(HI_MAX_72H).map(RiskClass::from_heat_index).collect())
    }

    fn predict_probability(&self, features: &FeatureMatrix) -> Result<Vec<ClassProbabilities>> {
        Ok(self
            .predict(features)?
            .into_iter()
            .map(|c| {
                let mut p = [0.0; RiskClass::COUNT];
                p[c.index()] = 1.0;
                p
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::RawFeatures;

    fn row(hi_max_72h: f64) -> RawFeatures {
        RawFeatures {
            population: 1.0e5,
            temp_c: 30.0,
            humidity: 40.0,
            wind_m_s: 2.0,
            solar_w_m2: 300.0,
            temp_roll_24h: 30.0,
            hi_max_72h,
            lag_risk: RiskClass::Safe,
        }
    }

    #[test]
    fn classifies_by_rolling_max() {
        let m = FeatureMatrix::from_raw(&[row(20.0), row(29.0), row(35.0), row(45.0)]);
        let preds = HeatIndexRules.predict(&m).unwrap();
        assert_eq!(
            preds,
            vec![RiskClass::Safe, RiskClass::Caution, RiskClass::Danger, RiskClass::Extreme]
        );
    }

    #[test]
    fn probabilities_are_one_hot() {
        let m = FeatureMatrix::from_raw(&[row(35.0)]);
        let p = HeatIndexRules.predict_probability(&m).unwrap();
        assert_eq!(p, vec![[0.0, 0.0, 1.0, 0.0]]);
    }
}
