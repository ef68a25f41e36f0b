//! Union-of-fields CSV output for flat records.

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::record::{field_union, Record};
use crate::write::WriteOutcome;

/// Write records as CSV. The header row is the lexicographically sorted
/// union of all observed field names; fields a record lacks render as
/// empty strings. An empty record set writes nothing.
pub fn write_records(path: &Path, records: &[Record]) -> Result<WriteOutcome> {
    if records.is_empty() {
        info!("no records to write");
        return Ok(WriteOutcome::Empty);
    }

    let fields = field_union(records);
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&fields)?;
    for record in records {
        let row: Vec<&str> = fields
            .iter()
            .map(|field| record.get(field).map(String::as_str).unwrap_or(""))
            .collect();
        writer.write_record(&row)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = records.len(), "records written");
    Ok(WriteOutcome::Written {
        path: path.to_path_buf(),
        rows: records.len(),
    })
}

/// Read a records CSV back into memory. Used to reload a previous run and
/// to verify that output round-trips.
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(
            headers
                .iter()
                .zip(row.iter())
                .map(|(header, value)| (header.to_string(), value.to_string()))
                .collect(),
        );
    }
    Ok(records)
}
