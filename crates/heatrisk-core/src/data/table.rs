//! Header-addressed delimited table whose feature columns feed a classifier.
//!
//! Cells are kept as text so that non-feature columns survive a round trip;
//! feature columns are parsed on demand.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::data::{csv_reader, open_csv, record_line, source_name};
use crate::error::{Error, Result};
use crate::features::{FeatureMatrix, FeatureRecord, FEATURE_COLUMNS};

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// 1-based line in the source file.
    pub line: u64,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub source_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl FeatureTable {
    pub fn load(path: &Path) -> Result<Self> {
        let rdr: csv::Reader<File> = open_csv(path)?;
        Self::read(rdr, &source_name(path))
    }

    pub fn from_reader<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        Self::read(csv_reader(reader), source_name)
    }

    fn read<R: Read>(mut rdr: csv::Reader<R>, source_name: &str) -> Result<Self> {
        let headers = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for rec in rdr.records() {
            let rec = rec?;
            rows.push(TableRow {
                line: record_line(&rec),
                cells: rec.iter().map(str::to_string).collect(),
            });
        }
        Ok(Self { source_name: source_name.to_string(), headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn text<'a>(&self, row: &'a TableRow, name: &str) -> Option<&'a str> {
        self.position(name).and_then(|i| row.cells.get(i)).map(String::as_str)
    }

    /// Fail with [`Error::MissingFeature`] on the first feature column absent
    /// from the header.
    pub fn require_feature_columns(&self) -> Result<()> {
        match FEATURE_COLUMNS.iter().find(|c| self.position(c).is_none()) {
            Some(c) => Err(Error::MissingFeature(c.to_string())),
            None => Ok(()),
        }
    }

    /// Parse every feature column present in the header. Absent columns are
    /// left out; [`FeatureRecord::assemble`] reports them.
    pub fn feature_record(&self, row: &TableRow) -> Result<FeatureRecord> {
        let mut rec = FeatureRecord::new();
        for name in FEATURE_COLUMNS {
            let Some(i) = self.position(name) else { continue };
            let cell = row.cells.get(i).map(String::as_str).unwrap_or("");
            let value: f64 = cell.parse().map_err(|_| {
                Error::invalid_data(&self.source_name, row.line, format!("{name}: not a number: {cell:?}"))
            })?;
            rec.insert(name, value);
        }
        Ok(rec)
    }

    pub fn feature_records(&self) -> Result<Vec<FeatureRecord>> {
        self.rows.iter().map(|r| self.feature_record(r)).collect()
    }

    /// Header check first, then row parsing and assembly.
    pub fn feature_matrix(&self) -> Result<FeatureMatrix> {
        self.require_feature_columns()?;
        FeatureMatrix::from_records(&self.feature_records()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "time,district_name,population_2020,pop_log,temp_c,humidity_relative,wind_speed_m_s,solar_w_m2,temp_roll_24h,hi_max_72h,risk_lag_1h";

    fn table_without(drop: Option<&str>) -> FeatureTable {
        let cols: Vec<&str> = HEADER.split(',').collect();
        let vals = ["2015-06-20 12:00:00", "Karachi", "16000000", "7.2", "44.0", "40", "4.1", "700", "41.2", "52.0", "3"];
        let keep: Vec<usize> = (0..cols.len()).filter(|&i| Some(cols[i]) != drop).collect();
        let header = keep.iter().map(|&i| cols[i]).collect::<Vec<_>>().join(",");
        let row = keep.iter().map(|&i| vals[i]).collect::<Vec<_>>().join(",");
        FeatureTable::from_reader(format!("{header}\n{row}\n").as_bytes(), "t.csv").unwrap()
    }

    #[test]
    fn full_table_assembles() {
        let t = table_without(None);
        let m = t.feature_matrix().unwrap();
        assert_eq!(m.len(), 1);
        assert_eq!(m.rows()[0][2], 44.0);
        assert_eq!(t.text(&t.rows[0], "district_name"), Some("Karachi"));
    }

    #[test]
    fn every_feature_column_is_required_by_name() {
        for name in FEATURE_COLUMNS {
            let t = table_without(Some(name));
            match t.feature_matrix() {
                Err(Error::MissingFeature(col)) => assert_eq!(col, name),
                other => panic!("without {name}: {other:?}"),
            }
        }
    }

    #[test]
    fn non_numeric_cell_reports_line() {
        let csv = format!("{HEADER}\n2015-06-20 12:00:00,Karachi,16000000,7.2,hot,40,4.1,700,41.2,52.0,3\n");
        let t = FeatureTable::from_reader(csv.as_bytes(), "t.csv").unwrap();
        match t.feature_matrix() {
            Err(Error::InvalidData { line, message, .. }) => {
                assert_eq!(line, 2);
                assert!(message.starts_with("temp_c"), "{message}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
