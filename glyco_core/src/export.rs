//! CSV export of the basal dose audit trail.

use crate::{BasalDoseEntry, Result};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    insulin_name: String,
    dose_units: f64,
    timestamp: String,
    confirmed: bool,
}

/// Write every entry to `csv_path`, replacing any previous export.
///
/// `is_confirmed` tells whether the remote store has accepted an entry.
/// The file is fsynced before returning. Returns the number of rows written.
pub fn export_history<F>(entries: &[BasalDoseEntry], csv_path: &Path, is_confirmed: F) -> Result<usize>
where
    F: Fn(&BasalDoseEntry) -> bool,
{
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(csv_path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(file);

    for entry in entries {
        writer.serialize(CsvRow {
            id: entry.id.to_string(),
            insulin_name: entry.insulin_name.clone(),
            dose_units: entry.dose_units,
            timestamp: entry.timestamp.to_rfc3339(),
            confirmed: is_confirmed(entry),
        })?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} basal entries to {:?}", entries.len(), csv_path);
    Ok(entries.len())
}
