//! Data handling and sources for the COVID-19 tracker

pub mod catalog;
pub mod config;
pub mod context;
pub mod dataset;
pub mod schema;
pub mod sources;

use arrow::error::ArrowError;
use ct_core::TransportError;
use thiserror::Error;
use tokio::task::JoinError;

// Re-exports
pub use catalog::ResourceCatalog;
pub use config::{EndpointConfig, NullConfig, SourceConfig};
pub use context::DataContext;
pub use dataset::TabularDataset;
pub use sources::SourceAdapter;

/// Errors that can occur in data operations
#[derive(Error, Debug)]
pub enum DataError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        source: TransportError,
    },

    #[error("failed to decode {path}: {message}")]
    Decode { path: String, message: String },

    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    #[error("row {row} out of range for {row_count} rows")]
    RowOutOfRange { row: usize, row_count: usize },

    #[error("empty dataset: {0}")]
    EmptyDataset(String),

    #[error("column '{column}' row {row}: expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        row: usize,
        expected: &'static str,
        found: String,
    },

    #[error("Arrow error: {0}")]
    Arrow(ArrowError),

    #[error("Join error: {0}")]
    Join(#[from] JoinError),
}

impl DataError {
    pub(crate) fn decode(path: &str, message: impl Into<String>) -> Self {
        DataError::Decode {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl From<ArrowError> for DataError {
    fn from(error: ArrowError) -> Self {
        DataError::Arrow(error)
    }
}
