//! CSV export of the dose history.

use crate::{aggregate, DoseLog, Result};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    id: i64,
    medicine: &'a str,
    date_time: String,
    is_edited: bool,
}

impl<'a> From<&'a DoseLog> for CsvRow<'a> {
    fn from(log: &'a DoseLog) -> Self {
        CsvRow {
            id: log.id,
            medicine: &log.medicine,
            date_time: log.date_time.to_rfc3339(),
            is_edited: log.is_edited,
        }
    }
}

/// Write every record, newest first, to a CSV file at `path`
///
/// The file is replaced if it exists. Returns the number of rows written.
pub fn export_csv(logs: &[DoseLog], path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut sorted = logs.to_vec();
    aggregate::sort_newest_first(&mut sorted);

    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    for log in &sorted {
        writer.serialize(CsvRow::from(log))?;
    }
    writer.flush()?;
    writer.get_ref().sync_all()?;

    tracing::info!("Exported {} logs to {:?}", sorted.len(), path);
    Ok(sorted.len())
}
