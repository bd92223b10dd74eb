//! Destinations for readings parsed off the link.
//!
//! The supervisor hands every accepted [`Reading`] to a [`ReadingSink`]. The
//! API server implements the trait for its ingestion gateway so readings
//! stay in-process; the standalone reader binary uses [`HttpForwarder`] to
//! POST them to a remote server.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use smartsense_core::reading::Reading;

use crate::error::ForwardError;

/// HTTP request timeout for a single forward.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Consumer of parsed readings.
#[async_trait]
pub trait ReadingSink: Send + Sync {
    async fn forward(&self, reading: Reading) -> Result<(), ForwardError>;
}

#[async_trait]
impl<S: ReadingSink + ?Sized> ReadingSink for Arc<S> {
    async fn forward(&self, reading: Reading) -> Result<(), ForwardError> {
        (**self).forward(reading).await
    }
}

// ---------------------------------------------------------------------------
// HttpForwarder
// ---------------------------------------------------------------------------

/// Forwards readings as JSON to a remote ingestion endpoint.
pub struct HttpForwarder {
    client: reqwest::Client,
    url: String,
}

impl HttpForwarder {
    /// Create a forwarder posting to `url` (e.g. `http://host:8000/data`).
    pub fn new(url: impl Into<String>) -> Result<Self, ForwardError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReadingSink for HttpForwarder {
    async fn forward(&self, reading: Reading) -> Result<(), ForwardError> {
        let response = self.client.post(&self.url).json(&reading).send().await?;
        if !response.status().is_success() {
            return Err(ForwardError::HttpStatus(response.status().as_u16()));
        }
        tracing::debug!(
            temperature = reading.temperature(),
            humidity = reading.humidity(),
            gas_level = reading.gas_level(),
            "Reading forwarded"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
