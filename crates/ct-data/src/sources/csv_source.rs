//! CSV decoding into tabular datasets

use csv::ReaderBuilder;
use ct_core::Value;
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::dataset::TabularDataset;
use crate::schema::SchemaDetector;
use crate::DataError;

/// Decode a UTF-8 CSV body whose first row names the columns
pub fn decode_csv(path: &str, body: &[u8], config: &SourceConfig) -> Result<TabularDataset, DataError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| DataError::decode(path, format!("body is not valid UTF-8: {}", e)))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    // Get headers
    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() {
        return Ok(TabularDataset::empty());
    }

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| csv_error(path, e))?;
        raw_rows.push(record.iter().map(|s| s.to_string()).collect());
    }

    // Detect column types
    let detector = SchemaDetector::new(config);
    let schema = detector.detect_from_samples(&headers, &raw_rows);
    for column in schema.unsorted_date_columns() {
        warn!("Date column '{}' in {} is not in ascending order", column, path);
    }

    let mut columns: Vec<(String, Vec<Value>)> = schema
        .columns
        .iter()
        .map(|c| (c.name.clone(), Vec::with_capacity(raw_rows.len())))
        .collect();

    for row in &raw_rows {
        for (col_idx, info) in schema.columns.iter().enumerate() {
            let raw = row.get(col_idx).map(String::as_str).unwrap_or("");
            columns[col_idx].1.push(detector.parse_cell(info.column_type, raw));
        }
    }

    debug!(
        "Decoded {} rows x {} columns from {}",
        raw_rows.len(),
        headers.len(),
        path
    );

    TabularDataset::from_columns(columns)
}

fn csv_error(path: &str, error: csv::Error) -> DataError {
    DataError::decode(path, format!("malformed CSV: {}", error))
}
