//! Loaders for the static inputs: baseline, coordinates, history slice and
//! district boundaries. All district names are canonicalized on load.

pub mod baseline;
pub mod coords;
pub mod geo;
pub mod history;
pub mod table;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::{require_asset, Error, Result};

pub use baseline::{BaselineRecord, BaselineTable, MonthContext};
pub use coords::{CoordinateTable, Coordinates};
pub use geo::{DistrictMap, JoinReport};
pub use history::{HistoryRow, HistoryTable};
pub use table::{FeatureTable, TableRow};

pub(crate) fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new().trim(Trim::All).from_reader(reader)
}

pub(crate) fn open_csv(path: &Path) -> Result<csv::Reader<File>> {
    require_asset(path)?;
    Ok(csv_reader(File::open(path)?))
}

pub(crate) fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Fail on the first `required` column absent from `headers`.
pub(crate) fn require_columns(
    headers: &StringRecord,
    required: &[&str],
    source_name: &str,
) -> Result<()> {
    for col in required {
        if !headers.iter().any(|h| h == *col) {
            return Err(Error::MissingColumn {
                source_name: source_name.to_string(),
                column: col.to_string(),
            });
        }
    }
    Ok(())
}

pub(crate) fn record_line(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}
