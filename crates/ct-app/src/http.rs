//! HTTP transport backed by reqwest

use std::time::Duration;

use async_trait::async_trait;
use ct_core::{Payload, Transport, TransportError};
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

/// GETs resources over HTTP(S) with a per-request timeout
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("covid-tracker/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

fn request_error(url: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout { url: url.to_string() }
    } else {
        TransportError::Request {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Payload, TransportError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(|e| request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| request_error(url, e))?;
        debug!("{} returned {} bytes", url, body.len());

        Ok(Payload {
            body: body.to_vec(),
            content_type,
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}
