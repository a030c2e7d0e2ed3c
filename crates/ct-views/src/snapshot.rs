//! Latest-snapshot selection over time-indexed datasets

use ct_core::Value;
use ct_data::{DataError, TabularDataset};
use tracing::debug;

/// Date of the last row.
///
/// Rows are assumed to be in ascending date order; this is not verified.
pub fn latest_date(dataset: &TabularDataset, date_column: &str) -> Result<Value, DataError> {
    if dataset.is_empty() {
        return Err(DataError::EmptyDataset(format!(
            "no rows to take the latest '{}' from",
            date_column
        )));
    }
    dataset.value(date_column, dataset.row_count() - 1)
}

/// Rows dated `target`, or dated like the last row when no target is given
pub fn latest_snapshot(
    dataset: &TabularDataset,
    date_column: &str,
    target: Option<&Value>,
) -> Result<TabularDataset, DataError> {
    let target = match target {
        Some(value) => {
            // Still fail on a missing column, even with an explicit target
            if !dataset.has_column(date_column) {
                return Err(DataError::ColumnNotFound(date_column.to_string()));
            }
            value.clone()
        }
        None => latest_date(dataset, date_column)?,
    };

    let snapshot = dataset.filter(date_column, &target)?;
    debug!("Snapshot for {} has {} rows", target, snapshot.row_count());
    Ok(snapshot)
}
