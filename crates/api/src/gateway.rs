//! Ingestion gateway: the single path every accepted reading takes.
//!
//! HTTP submissions and the in-process serial link both end up in
//! [`IngestionGateway::ingest`], which classifies the reading, stamps it
//! with the server clock, and hands the resulting envelope to the hub.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use smartsense_core::classify::{classify_reading, Thresholds};
use smartsense_core::reading::{Envelope, Reading};
use smartsense_link::error::ForwardError;
use smartsense_link::sink::ReadingSink;

use crate::ws::BroadcastHub;

pub struct IngestionGateway {
    hub: Arc<BroadcastHub>,
    thresholds: Thresholds,
}

impl IngestionGateway {
    pub fn new(hub: Arc<BroadcastHub>, thresholds: Thresholds) -> Self {
        Self { hub, thresholds }
    }

    /// Classify, timestamp and broadcast one reading.
    ///
    /// Delivery is best effort: the envelope is returned whether or not any
    /// observer received it.
    pub async fn ingest(&self, reading: Reading) -> Envelope {
        let tier = classify_reading(&reading, &self.thresholds);
        let envelope = Envelope::new(reading, tier, Utc::now());
        let delivered = self.hub.broadcast(&envelope).await;

        tracing::info!(
            temperature = reading.temperature(),
            humidity = reading.humidity(),
            gas_level = reading.gas_level(),
            status = %tier,
            delivered,
            "Reading ingested",
        );

        envelope
    }
}

/// Lets the serial supervisor feed the gateway directly when the link runs
/// inside the server process.
#[async_trait]
impl ReadingSink for IngestionGateway {
    async fn forward(&self, reading: Reading) -> Result<(), ForwardError> {
        self.ingest(reading).await;
        Ok(())
    }
}
