//! Timestamped per-district readings over a fixed date range (replay input).

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};

use crate::data::table::FeatureTable;
use crate::error::{Error, Result};
use crate::features::FeatureRecord;
use crate::names::canonical_district_name;

const TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub time: NaiveDateTime,
    pub district_name: String,
    pub features: FeatureRecord,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryTable {
    rows: Vec<HistoryRow>,
}

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|t| t.naive_utc()))
}

impl HistoryTable {
    pub fn load(path: &Path) -> Result<Self> {
        let table = Self::from_table(&FeatureTable::load(path)?)?;
        log::info!("Loaded history {} ({} rows)", path.display(), table.len());
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        Self::from_table(&FeatureTable::from_reader(reader, source_name)?)
    }

    /// Rows sorted by time; ties keep file order.
    pub fn from_table(table: &FeatureTable) -> Result<Self> {
        for col in ["time", "district_name"] {
            if table.position(col).is_none() {
                return Err(Error::MissingColumn {
                    source_name: table.source_name.clone(),
                    column: col.to_string(),
                });
            }
        }

        let mut rows = Vec::with_capacity(table.len());
        for row in &table.rows {
            let raw_time = table.text(row, "time").unwrap_or("");
            let time = parse_timestamp(raw_time).ok_or_else(|| {
                Error::invalid_data(&table.source_name, row.line, format!("bad timestamp {raw_time:?}"))
            })?;
            let district = table.text(row, "district_name").unwrap_or("");
            rows.push(HistoryRow {
                time,
                district_name: canonical_district_name(district),
                features: table.feature_record(row)?,
            });
        }
        rows.sort_by_key(|r| r.time);
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[HistoryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
