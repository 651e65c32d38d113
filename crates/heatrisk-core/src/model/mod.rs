//! Classifier capability interface.
//!
//! The simulator, the live path and the replay builder only see
//! [`RiskModel`]; backends can be swapped without touching them.

pub mod forest;
pub mod rules;

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::features::FeatureMatrix;
use crate::risk::RiskClass;

pub use forest::ForestModel;
pub use rules::HeatIndexRules;

/// Per-class probabilities, indexed by [`RiskClass::index`].
pub type ClassProbabilities = [f64; RiskClass::COUNT];

/// A pre-trained multi-class heat-risk classifier.
pub trait RiskModel: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<RiskClass>>;

    fn predict_probability(&self, features: &FeatureMatrix) -> Result<Vec<ClassProbabilities>>;
}

/// Arg-max over class probabilities. Ties resolve to the lower class.
pub fn most_likely(p: &ClassProbabilities) -> RiskClass {
    let mut best = 0usize;
    for i in 1..RiskClass::COUNT {
        if p[i] > p[best] {
            best = i;
        }
    }
    RiskClass::ALL[best]
}

/// Where the classifier comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    /// Serialised tree ensemble (JSON).
    Forest(PathBuf),
    /// Deterministic heat-index thresholds; needs no artifact.
    Rules,
}

impl ModelSource {
    pub fn forest(path: impl AsRef<Path>) -> Self {
        ModelSource::Forest(path.as_ref().to_path_buf())
    }
}

pub fn load_model(source: &ModelSource) -> Result<Box<dyn RiskModel>> {
    match source {
        ModelSource::Forest(path) => {
            let model = ForestModel::load(path)?;
            log::info!(
                "Loaded forest model from {} ({} trees)",
                path.display(),
                model.n_trees()
            );
            Ok(Box::new(model))
        }
        ModelSource::Rules => Ok(Box::new(HeatIndexRules)),
    }
}
