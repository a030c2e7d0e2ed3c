//! Fetching remote resources and decoding them into datasets

pub mod csv_source;
pub mod json_source;

use std::sync::Arc;

use ct_core::{Payload, SourceFormat, Transport};
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::dataset::TabularDataset;
use crate::DataError;

pub use csv_source::decode_csv;
pub use json_source::decode_json;

/// Per-request decoding options
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Format override; otherwise detected from the path, then the content type
    pub format: Option<SourceFormat>,
    /// Key of the record array inside a JSON object body
    pub record_path: Option<String>,
}

impl DecodeOptions {
    pub fn with_format(mut self, format: Option<SourceFormat>) -> Self {
        self.format = format;
        self
    }

    pub fn with_record_path(mut self, record_path: Option<String>) -> Self {
        self.record_path = record_path;
        self
    }
}

/// Fetches resources by URL and decodes them into datasets
#[derive(Clone)]
pub struct SourceAdapter {
    transport: Arc<dyn Transport>,
    config: SourceConfig,
}

impl SourceAdapter {
    pub fn new(transport: Arc<dyn Transport>, config: SourceConfig) -> Self {
        Self { transport, config }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Fetch `path` and decode it according to its declared format
    pub async fn fetch_and_decode(&self, path: &str) -> Result<TabularDataset, DataError> {
        self.fetch_and_decode_with(path, &DecodeOptions::default()).await
    }

    /// Fetch `path` and decode it with explicit options
    pub async fn fetch_and_decode_with(
        &self,
        path: &str,
        options: &DecodeOptions,
    ) -> Result<TabularDataset, DataError> {
        info!("Fetching {} via {} transport", path, self.transport.name());

        let payload = self
            .transport
            .get(path)
            .await
            .map_err(|source| DataError::Fetch {
                url: path.to_string(),
                source,
            })?;

        debug!("Received {} bytes from {}", payload.body.len(), path);

        // Decoding is CPU-bound; keep it off the async workers
        let path = path.to_string();
        let options = options.clone();
        let config = self.config.clone();
        let dataset = tokio::task::spawn_blocking(move || decode(&path, &payload, &options, &config)).await??;

        info!(
            "Loaded {} rows x {} columns",
            dataset.row_count(),
            dataset.column_count()
        );
        Ok(dataset)
    }

    /// Decode an already fetched payload
    pub fn decode(&self, path: &str, payload: &Payload, options: &DecodeOptions) -> Result<TabularDataset, DataError> {
        decode(path, payload, options, &self.config)
    }
}

/// Resolve the payload's format and decode it
pub fn decode(
    path: &str,
    payload: &Payload,
    options: &DecodeOptions,
    config: &SourceConfig,
) -> Result<TabularDataset, DataError> {
    let format = options
        .format
        .or_else(|| SourceFormat::from_path(path))
        .or_else(|| {
            payload
                .content_type
                .as_deref()
                .and_then(SourceFormat::from_content_type)
        })
        .ok_or_else(|| DataError::decode(path, "cannot determine the resource format"))?;

    debug!("Decoding {} as {}", path, format.name());

    match format {
        SourceFormat::Csv => decode_csv(path, &payload.body, config),
        SourceFormat::Json => decode_json(path, &payload.body, options.record_path.as_deref(), config),
    }
}
