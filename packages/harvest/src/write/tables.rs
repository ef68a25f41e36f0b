//! One CSV file per parsed HTML table.
//!
//! The workbook rendering: each table becomes `TableN.csv` inside the
//! output directory, header row first, short rows padded with empty
//! trailing cells.

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::extract::table::Table;
use crate::write::WriteOutcome;

/// Write one CSV per table into `dir`, creating it as needed. An empty
/// table set creates nothing, not even the directory.
pub fn write_table_set(dir: &Path, tables: &[Table]) -> Result<WriteOutcome> {
    if tables.is_empty() {
        info!("no tables to write");
        return Ok(WriteOutcome::Empty);
    }

    std::fs::create_dir_all(dir)?;
    for (index, table) in tables.iter().enumerate() {
        let path = dir.join(format!("Table{}.csv", index + 1));
        let mut writer = csv::WriterBuilder::new().flexible(true).from_path(&path)?;

        if !table.headers.is_empty() {
            writer.write_record(&table.headers)?;
        }
        let width = table.headers.len();
        for row in &table.rows {
            if row.len() < width {
                let mut padded = row.clone();
                padded.resize(width, String::new());
                writer.write_record(&padded)?;
            } else {
                writer.write_record(row)?;
            }
        }
        writer.flush()?;
    }

    info!(dir = %dir.display(), tables = tables.len(), "table set written");
    Ok(WriteOutcome::Written {
        path: dir.to_path_buf(),
        rows: tables.len(),
    })
}
