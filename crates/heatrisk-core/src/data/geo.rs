//! District boundary GeoJSON and the result-to-map join.
//!
//! The join key is the `district_name` feature property, canonicalized on
//! load. Districts present on one side only never fail the join: unmatched
//! features are painted with a neutral placeholder and reported.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{require_asset, Error, Result};
use crate::names::canonical_district_name;
use crate::scenario::ScenarioRow;

pub const NAME_PROPERTY: &str = "district_name";

/// Fill for features with no matching result row.
pub const PLACEHOLDER_FILL: [u8; 4] = [20, 20, 20, 255];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JoinReport {
    pub matched: usize,
    /// Map features with no result row.
    pub unmatched_features: Vec<String>,
    /// Result rows with no map feature.
    pub unmapped_districts: Vec<String>,
}

impl JoinReport {
    pub fn is_complete(&self) -> bool {
        self.unmatched_features.is_empty() && self.unmapped_districts.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistrictMap {
    collection: Value,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

impl DistrictMap {
    pub fn load(path: &Path) -> Result<Self> {
        require_asset(path)?;
        let value: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
        let map = Self::from_value(value, &path.display().to_string())?;
        log::info!("Loaded district map {} ({} features)", path.display(), map.len());
        Ok(map)
    }

    /// Validate a FeatureCollection and canonicalize its district names.
    pub fn from_value(mut collection: Value, source_name: &str) -> Result<Self> {
        if collection.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
            return Err(Error::invalid_data(source_name, 0, "not a GeoJSON FeatureCollection"));
        }
        let features = collection
            .get_mut("features")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| Error::invalid_data(source_name, 0, "missing features array"))?;

        for (i, feature) in features.iter_mut().enumerate() {
            if !feature.is_object() {
                return Err(Error::invalid_data(source_name, 0, format!("feature {i} is not an object")));
            }
            let name = feature
                .pointer("/properties/district_name")
                .and_then(Value::as_str)
                .map(canonical_district_name);
            match name {
                Some(name) => feature["properties"][NAME_PROPERTY] = Value::String(name),
                None => log::warn!("{source_name}: feature {i} has no {NAME_PROPERTY} property"),
            }
        }
        Ok(Self { collection })
    }

    fn features(&self) -> &[Value] {
        self.collection
            .get("features")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.features().len()
    }

    pub fn is_empty(&self) -> bool {
        self.features().is_empty()
    }

    pub fn district_names(&self) -> BTreeSet<String> {
        self.features()
            .iter()
            .filter_map(|f| f.pointer("/properties/district_name").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }

    pub fn as_value(&self) -> &Value {
        &self.collection
    }

    /// Copy of the collection with per-district risk attributes attached.
    ///
    /// Matched features get `fill_color`, `hi`, `temp` and `risk_label`;
    /// unmatched features get [`PLACEHOLDER_FILL`] and `hi = "N/A"`.
    pub fn annotate(&self, rows: &[ScenarioRow]) -> (Value, JoinReport) {
        // First row per district wins.
        let mut by_name: BTreeMap<&str, &ScenarioRow> = BTreeMap::new();
        for r in rows {
            by_name.entry(r.district_name.as_str()).or_insert(r);
        }

        let mut out = self.collection.clone();
        let mut report = JoinReport::default();
        let mut seen = BTreeSet::new();

        if let Some(features) = out.get_mut("features").and_then(Value::as_array_mut) {
            for feature in features.iter_mut() {
                let name = feature
                    .pointer("/properties/district_name")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string();
                let Some(obj) = feature.as_object_mut() else {
                    report.unmatched_features.push(name);
                    continue;
                };
                let props = obj.entry("properties").or_insert_with(|| json!({}));
                if !props.is_object() {
                    *props = json!({});
                }
                match by_name.get(name.as_str()) {
                    Some(row) => {
                        props["fill_color"] = json!(row.predicted_risk.fill_color());
                        props["hi"] = json!(round1(row.heat_index_c));
                        props["temp"] = json!(round1(row.temp_c));
                        props["risk_label"] = json!(row.risk_label);
                        report.matched += 1;
                        seen.insert(name);
                    }
                    None => {
                        props["fill_color"] = json!(PLACEHOLDER_FILL);
                        props["hi"] = json!("N/A");
                        report.unmatched_features.push(name);
                    }
                }
            }
        }

        report.unmapped_districts = by_name
            .keys()
            .filter(|n| !seen.contains(**n))
            .map(|n| n.to_string())
            .collect();

        if !report.is_complete() {
            log::warn!(
                "District join: {} matched, {} map features without data {:?}, {} districts not on map {:?}",
                report.matched,
                report.unmatched_features.len(),
                report.unmatched_features,
                report.unmapped_districts.len(),
                report.unmapped_districts,
            );
        }
        (out, report)
    }
}
