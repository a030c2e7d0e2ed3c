//! Table model for the data table panel

use ct_data::{DataError, TabularDataset};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the data table panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub max_rows_displayed: usize,
    /// Column to sort by before capping
    pub sort_column: Option<String>,
    pub descending: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_rows_displayed: 1000,
            sort_column: None,
            descending: false,
        }
    }
}

/// Headers plus stringified rows, ready to render
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableModel {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Row count before capping
    pub total_rows: usize,
}

impl TableModel {
    pub fn is_truncated(&self) -> bool {
        self.rows.len() < self.total_rows
    }
}

/// First `max_rows` rows of `dataset`, nulls rendered as empty cells
pub fn table_model(dataset: &TabularDataset, max_rows: usize) -> Result<TableModel, DataError> {
    let shown = dataset.row_count().min(max_rows);
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(shown);
    for row in 0..shown {
        rows.push(dataset.row(row)?.iter().map(|v| v.to_string()).collect());
    }

    if shown < dataset.row_count() {
        debug!("Table capped at {} of {} rows", shown, dataset.row_count());
    }

    Ok(TableModel {
        columns: dataset.column_names(),
        rows,
        total_rows: dataset.row_count(),
    })
}

/// Table model after the configured sort
pub fn sorted_table_model(dataset: &TabularDataset, config: &TableConfig) -> Result<TableModel, DataError> {
    match &config.sort_column {
        Some(column) => table_model(&dataset.sort_by(column, config.descending)?, config.max_rows_displayed),
        None => table_model(dataset, config.max_rows_displayed),
    }
}
