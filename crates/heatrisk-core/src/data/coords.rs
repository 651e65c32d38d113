//! District centroid coordinates, used only by the live fetch.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::{csv_reader, open_csv, record_line, require_columns, source_name};
use crate::error::{Error, Result};
use crate::names::canonical_district_name;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Deserialize)]
struct CoordRow {
    district_name: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinateTable {
    by_name: BTreeMap<String, Coordinates>,
}

impl CoordinateTable {
    pub fn load(path: &Path) -> Result<Self> {
        let name = source_name(path);
        let table = Self::read(open_csv(path)?, &name)?;
        log::info!("Loaded coordinates {} ({} districts)", path.display(), table.len());
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        Self::read(csv_reader(reader), source_name)
    }

    fn read<R: Read>(mut rdr: csv::Reader<R>, source_name: &str) -> Result<Self> {
        let headers = rdr.headers()?.clone();
        require_columns(&headers, &["district_name", "lat", "lon"], source_name)?;

        let mut by_name = BTreeMap::new();
        for row in rdr.records() {
            let row = row?;
            let line = record_line(&row);
            let r: CoordRow = row
                .deserialize(Some(&headers))
                .map_err(|e| Error::invalid_data(source_name, line, e.to_string()))?;
            if !(-90.0..=90.0).contains(&r.lat) || !(-180.0..=180.0).contains(&r.lon) {
                return Err(Error::invalid_data(
                    source_name,
                    line,
                    format!("coordinates ({}, {}) out of range", r.lat, r.lon),
                ));
            }
            by_name.insert(
                canonical_district_name(&r.district_name),
                Coordinates { lat: r.lat, lon: r.lon },
            );
        }
        Ok(Self { by_name })
    }

    pub fn get(&self, district: &str) -> Option<Coordinates> {
        self.by_name.get(&canonical_district_name(district)).copied()
    }

    /// District names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_name.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
