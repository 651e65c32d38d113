//! Historical replay: classify a timestamped slice and aggregate it into
//! fixed-interval animation frames.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::data::history::HistoryRow;
use crate::error::{Error, Result};
use crate::features::{FeatureMatrix, FeatureRecord};
use crate::heat_index::heat_index;
use crate::model::RiskModel;
use crate::risk::RiskClass;

pub const DEFAULT_INTERVAL_HOURS: u32 = 4;

pub const FRAME_LABEL_FORMAT: &str = "%Y-%m-%d %H:00";

/// One district within one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayCell {
    pub district_name: String,
    /// Worst class predicted within the interval.
    pub predicted_risk: RiskClass,
    pub risk_label: &'static str,
    pub heat_index_c: f64,
    pub temp_c: f64,
    pub population: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayFrame {
    pub start: NaiveDateTime,
    pub label: String,
    pub cells: Vec<ReplayCell>,
}

/// Floor `t` to a multiple of `hours` since midnight.
pub fn floor_to_interval(t: NaiveDateTime, hours: u32) -> NaiveDateTime {
    let hours = hours.clamp(1, 24);
    t - Duration::hours(i64::from(t.hour() % hours))
        - Duration::minutes(i64::from(t.minute()))
        - Duration::seconds(i64::from(t.second()))
        - Duration::nanoseconds(i64::from(t.nanosecond()))
}

struct Acc {
    risk: RiskClass,
    hi: f64,
    temp: f64,
    population: f64,
}

/// Classify every history row and aggregate per (district, interval):
/// max risk, max heat index, max temperature, first population.
pub fn build_frames(
    history: &[HistoryRow],
    model: &dyn RiskModel,
    interval_hours: u32,
) -> Result<Vec<ReplayFrame>> {
    if history.is_empty() {
        return Ok(Vec::new());
    }

    let records: Vec<FeatureRecord> = history.iter().map(|r| r.features.clone()).collect();
    let matrix = FeatureMatrix::from_records(&records)?;
    let preds = model.predict(&matrix)?;
    if preds.len() != history.len() {
        return Err(Error::Model(format!(
            "{} returned {} predictions for {} rows",
            model.name(),
            preds.len(),
            history.len()
        )));
    }

    let mut buckets: BTreeMap<NaiveDateTime, BTreeMap<String, Acc>> = BTreeMap::new();
    for (row, risk) in history.iter().zip(preds) {
        let temp = row.features.require("temp_c")?;
        let hi = heat_index(temp, row.features.require("humidity_relative")?);
        let population = row.features.require("population_2020")?;

        let start = floor_to_interval(row.time, interval_hours);
        buckets
            .entry(start)
            .or_default()
            .entry(row.district_name.clone())
            .and_modify(|a| {
                a.risk = a.risk.max(risk);
                a.hi = a.hi.max(hi);
                a.temp = a.temp.max(temp);
            })
            .or_insert(Acc { risk, hi, temp, population });
    }

    let frames: Vec<ReplayFrame> = buckets
        .into_iter()
        .map(|(start, cells)| ReplayFrame {
            start,
            label: start.format(FRAME_LABEL_FORMAT).to_string(),
            cells: cells
                .into_iter()
                .map(|(district_name, a)| ReplayCell {
                    district_name,
                    predicted_risk: a.risk,
                    risk_label: a.risk.label(),
                    heat_index_c: a.hi,
                    temp_c: a.temp,
                    population: a.population,
                })
                .collect(),
        })
        .collect();

    log::info!(
        "Replay: {} rows → {} frames at {}h intervals",
        history.len(),
        frames.len(),
        interval_hours
    );
    Ok(frames)
}
