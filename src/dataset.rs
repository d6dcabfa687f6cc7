//! Dataset ingestion: parse a CSV into the row maps the rasterizer consumes.
//!
//! The header row defines column names. Missing trailing cells resolve to
//! empty strings (which the rasterizer treats as "skip this field"), so one
//! ragged row never fails a batch.

use serde_json::Value;
use std::io::Read;
use std::path::Path;

use crate::error::LanyardError;
use crate::template::DataRow;

/// Parse CSV from any reader into rows, preserving input order.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<DataRow>, LanyardError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| LanyardError::Data(format!("failed to read CSV header: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (i, record) in csv_reader.records().enumerate() {
        let record =
            record.map_err(|e| LanyardError::Data(format!("CSV row {}: {}", i + 1, e)))?;
        let mut row = DataRow::with_capacity(headers.len());
        for (col, header) in headers.iter().enumerate() {
            let value = record.get(col).unwrap_or("");
            row.insert(header.clone(), Value::String(value.to_string()));
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Parse a CSV file from disk.
pub fn read_rows_from_path(path: &Path) -> Result<Vec<DataRow>, LanyardError> {
    let file = std::fs::File::open(path)?;
    read_rows(file)
}
