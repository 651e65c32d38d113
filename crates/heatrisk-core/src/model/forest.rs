//! Decision-tree ensemble backend loaded from a JSON artifact.
//!
//! Each tree is stored as parallel node arrays (`children_left`,
//! `children_right`, `feature`, `threshold`, `value`). A node is a leaf when
//! its left child is `-1`; otherwise samples with `x[feature] <= threshold`
//! go left. Leaf `value` rows hold class weights and are normalised per tree
//! before averaging across the ensemble.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{require_asset, Error, Result};
use crate::features::{FeatureMatrix, FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT};
use crate::model::{most_likely, ClassProbabilities, RiskModel};
use crate::risk::RiskClass;

const LEAF: i64 = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNodes {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestModel {
    pub feature_names: Vec<String>,
    pub n_classes: usize,
    pub trees: Vec<TreeNodes>,
}

impl ForestModel {
    pub fn load(path: &Path) -> Result<Self> {
        require_asset(path)?;
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let model: ForestModel = serde_json::from_str(text)?;
        model.validate()?;
        Ok(model)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Structural checks so that evaluation can index without bounds failures
    /// and every descent terminates.
    pub fn validate(&self) -> Result<()> {
        if self.feature_names.len() != FEATURE_COUNT
            || self.feature_names.iter().zip(FEATURE_COLUMNS).any(|(a, b)| a != b)
        {
            return Err(Error::Model(format!(
                "feature layout mismatch: model expects {:?}",
                self.feature_names
            )));
        }
        if self.n_classes != RiskClass::COUNT {
            return Err(Error::Model(format!(
                "expected {} classes, artifact declares {}",
                RiskClass::COUNT,
                self.n_classes
            )));
        }
        if self.trees.is_empty() {
            return Err(Error::Model("ensemble has no trees".into()));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            validate_tree(tree).map_err(|msg| Error::Model(format!("tree {t}: {msg}")))?;
        }
        Ok(())
    }

    fn tree_probabilities(tree: &TreeNodes, x: &FeatureVector) -> ClassProbabilities {
        let mut node = 0usize;
        while tree.children_left[node] != LEAF {
            let f = tree.feature[node] as usize;
            node = if x[f] <= tree.threshold[node] {
                tree.children_left[node] as usize
            } else {
                tree.children_right[node] as usize
            };
        }
        let weights = &tree.value[node];
        let total: f64 = weights.iter().sum();
        let mut p = [0.0; RiskClass::COUNT];
        if total > 0.0 {
            for (slot, w) in p.iter_mut().zip(weights) {
                *slot = w / total;
            }
        }
        p
    }

    fn row_probabilities(&self, x: &FeatureVector) -> ClassProbabilities {
        let mut acc = [0.0; RiskClass::COUNT];
        for tree in &self.trees {
            let p = Self::tree_probabilities(tree, x);
            for (a, v) in acc.iter_mut().zip(p) {
                *a += v;
            }
        }
        let n = self.trees.len() as f64;
        acc.map(|a| a / n)
    }
}

fn validate_tree(tree: &TreeNodes) -> std::result::Result<(), String> {
    let n = tree.children_left.len();
    if n == 0 {
        return Err("no nodes".into());
    }
    if tree.children_right.len() != n
        || tree.feature.len() != n
        || tree.threshold.len() != n
        || tree.value.len() != n
    {
        return Err("node arrays have different lengths".into());
    }
    for i in 0..n {
        if tree.value[i].len() != RiskClass::COUNT {
            return Err(format!("node {i}: value row has {} entries", tree.value[i].len()));
        }
        let (l, r) = (tree.children_left[i], tree.children_right[i]);
        if l == LEAF {
            continue;
        }
        // Children strictly after the parent: descent always terminates.
        for child in [l, r] {
            if child <= i as i64 || child >= n as i64 {
                return Err(format!("node {i}: child index {child} out of order"));
            }
        }
        let f = tree.feature[i];
        if f < 0 || f >= FEATURE_COUNT as i64 {
            return Err(format!("node {i}: feature index {f} out of range"));
        }
    }
    Ok(())
}

impl RiskModel for ForestModel {
    fn name(&self) -> &str {
        "forest"
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<RiskClass>> {
        Ok(self.predict_probability(features)?.iter().map(most_likely).collect())
    }

    #[cfg(not(feature = "threading"))]
    fn predict_probability(&self, features: &FeatureMatrix) -> Result<Vec<ClassProbabilities>> {
        Ok(features.rows().iter().map(|x| self.row_probabilities(x)).collect())
    }

    #[cfg(feature = "threading")]
    fn predict_probability(&self, features: &FeatureMatrix) -> Result<Vec<ClassProbabilities>> {
        use rayon::prelude::*;
        Ok(features.rows().par_iter().map(|x| self.row_probabilities(x)).collect())
    }
}
