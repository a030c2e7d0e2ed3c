//! Transport seam for reaching upstream data sources

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

/// Raw response body plus the metadata needed to decode it
#[derive(Debug, Clone)]
pub struct Payload {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

impl Payload {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Errors raised while reaching a data source
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Trait for anything that can GET a resource by URL
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the resource at `url`
    async fn get(&self, url: &str) -> Result<Payload, TransportError>;

    /// Get the transport name for logging
    fn name(&self) -> &str;
}

/// In-memory transport serving fixed payloads.
///
/// Serves pages built from payloads already in hand, and tests.
#[derive(Default)]
pub struct StaticTransport {
    payloads: RwLock<AHashMap<String, Payload>>,
    requests: AtomicUsize,
}

impl StaticTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payload served for `url`
    pub fn insert(&self, url: impl Into<String>, payload: Payload) {
        self.payloads.write().insert(url.into(), payload);
    }

    /// Builder-style variant of [`StaticTransport::insert`]
    pub fn with(self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.insert(url, Payload::new(body));
        self
    }

    /// Number of requests served so far, including failed ones
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn into_shared(self) -> Arc<dyn Transport> {
        Arc::new(self)
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn get(&self, url: &str) -> Result<Payload, TransportError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Serving static payload for {}", url);

        self.payloads
            .read()
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                url: url.to_string(),
                status: 404,
            })
    }

    fn name(&self) -> &str {
        "static"
    }
}
