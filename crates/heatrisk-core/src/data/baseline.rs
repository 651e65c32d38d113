//! Seasonal baseline: one row per (district, month).

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::{csv_reader, open_csv, record_line, require_columns, source_name};
use crate::error::{Error, Result};
use crate::names::canonical_district_name;

pub const BASELINE_COLUMNS: [&str; 9] = [
    "district_name",
    "month",
    "population_2020",
    "temp_c",
    "humidity_relative",
    "wind_speed_m_s",
    "solar_w_m2",
    "temp_roll_24h",
    "hi_max_72h",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineRecord {
    pub district_name: String,
    pub month: u8,
    #[serde(rename = "population_2020")]
    pub population: f64,
    pub temp_c: f64,
    #[serde(rename = "humidity_relative")]
    pub humidity: f64,
    #[serde(rename = "wind_speed_m_s")]
    pub wind_m_s: f64,
    pub solar_w_m2: f64,
    pub temp_roll_24h: f64,
    pub hi_max_72h: f64,
}

impl BaselineRecord {
    fn check(&self) -> std::result::Result<(), String> {
        if !(1..=12).contains(&self.month) {
            return Err(format!("month {} outside 1..=12", self.month));
        }
        if !(0.0..=100.0).contains(&self.humidity) {
            return Err(format!("humidity {} outside [0, 100]", self.humidity));
        }
        if !(self.population >= 0.0) {
            return Err(format!("population {} is negative or NaN", self.population));
        }
        Ok(())
    }
}

/// Baseline conditions of one month, averaged over its districts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthContext {
    pub month: u8,
    pub districts: usize,
    pub mean_temp_c: f64,
    pub mean_humidity: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaselineTable {
    records: Vec<BaselineRecord>,
}

impl BaselineTable {
    pub fn new(records: Vec<BaselineRecord>) -> Self {
        Self { records }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let name = source_name(path);
        let table = Self::read(open_csv(path)?, &name)?;
        log::info!("Loaded baseline {} ({} rows)", path.display(), table.len());
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R, source_name: &str) -> Result<Self> {
        Self::read(csv_reader(reader), source_name)
    }

    fn read<R: Read>(mut rdr: csv::Reader<R>, source_name: &str) -> Result<Self> {
        let headers = rdr.headers()?.clone();
        require_columns(&headers, &BASELINE_COLUMNS, source_name)?;

        let mut records = Vec::new();
        for row in rdr.records() {
            let row = row?;
            let line = record_line(&row);
            let mut rec: BaselineRecord = row
                .deserialize(Some(&headers))
                .map_err(|e| Error::invalid_data(source_name, line, e.to_string()))?;
            rec.check().map_err(|msg| Error::invalid_data(source_name, line, msg))?;
            rec.district_name = canonical_district_name(&rec.district_name);
            records.push(rec);
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[BaselineRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn for_month(&self, month: u8) -> impl Iterator<Item = &BaselineRecord> + '_ {
        self.records.iter().filter(move |r| r.month == month)
    }

    pub fn months(&self) -> BTreeSet<u8> {
        self.records.iter().map(|r| r.month).collect()
    }

    pub fn district_names(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.district_name.as_str()).collect()
    }

    /// Population of the first row for `district` (canonicalized before lookup).
    pub fn population_of(&self, district: &str) -> Option<f64> {
        let name = canonical_district_name(district);
        self.records.iter().find(|r| r.district_name == name).map(|r| r.population)
    }

    pub fn month_context(&self, month: u8) -> Option<MonthContext> {
        let (n, t, h) = self
            .for_month(month)
            .fold((0usize, 0.0, 0.0), |(n, t, h), r| (n + 1, t + r.temp_c, h + r.humidity));
        (n > 0).then(|| MonthContext {
            month,
            districts: n,
            mean_temp_c: t / n as f64,
            mean_humidity: h / n as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const CSV: &str = "\
district_name,month,population_2020,pop_log,temp_c,humidity_relative,wind_speed_m_s,solar_w_m2,temp_roll_24h,hi_max_72h
jacobabad ,6,200000,5.30103,38.0,25.0,3.1,640.0,37.5,40.2
Lahore,6,11000000,7.04139,33.0,45.0,2.2,580.0,32.6,38.9
Lahore,5,11000000,7.04139,31.0,35.0,2.4,600.0,30.8,34.0
";

    #[test]
    fn loads_and_canonicalizes_names() {
        let t = BaselineTable::from_reader(CSV.as_bytes(), "app_baseline.csv").unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.records()[0].district_name, "Jacobabad");
        assert_eq!(t.population_of("  JACOBABAD"), Some(200000.0));
        assert_eq!(t.months().into_iter().collect::<Vec<_>>(), vec![5, 6]);
    }

    #[test]
    fn month_context_averages_rows() {
        let t = BaselineTable::from_reader(CSV.as_bytes(), "app_baseline.csv").unwrap();
        let ctx = t.month_context(6).unwrap();
        assert_eq!(ctx.districts, 2);
        assert_abs_diff_eq!(ctx.mean_temp_c, 35.5, epsilon = 1e-12);
        assert_abs_diff_eq!(ctx.mean_humidity, 35.0, epsilon = 1e-12);
        assert!(t.month_context(1).is_none());
    }

    #[test]
    fn missing_header_is_named() {
        let csv = "district_name,month,population_2020,temp_c,humidity_relative,wind_speed_m_s,solar_w_m2,temp_roll_24h\n";
        let err = BaselineTable::from_reader(csv.as_bytes(), "b.csv").unwrap_err();
        match err {
            Error::MissingColumn { column, .. } => assert_eq!(column, "hi_max_72h"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn humidity_out_of_range_is_rejected_with_line() {
        let csv = CSV.replace("45.0", "145.0");
        let err = BaselineTable::from_reader(csv.as_bytes(), "b.csv").unwrap_err();
        match err {
            Error::InvalidData { line, message, .. } => {
                assert_eq!(line, 3);
                assert!(message.contains("humidity"), "{message}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn negative_population_is_rejected() {
        let csv = CSV.replace("200000", "-5");
        assert!(matches!(
            BaselineTable::from_reader(csv.as_bytes(), "b.csv"),
            Err(Error::InvalidData { .. })
        ));
    }

    #[test]
    fn stored_alias_name_is_found_again() {
        let csv = CSV.replace("jacobabad ", "jakobabad");
        let t = BaselineTable::from_reader(csv.as_bytes(), "b.csv").unwrap();
        let stored = t.records()[0].district_name.clone();
        assert_eq!(stored, "Jacobabad");
        assert_eq!(t.population_of(&stored), Some(200000.0));
    }

    #[test]
    fn absent_file_is_missing_asset() {
        let err = BaselineTable::load(Path::new("app/data/none.csv")).unwrap_err();
        assert!(matches!(err, Error::MissingAsset { .. }));
    }
}
