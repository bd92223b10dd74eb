use std::sync::Arc;

use crate::config::ServerConfig;
use crate::gateway::IngestionGateway;
use crate::ws::BroadcastHub;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Live observer registry (dashboard WebSocket clients).
    pub hub: Arc<BroadcastHub>,
    /// Classifies and fans out every accepted reading.
    pub gateway: Arc<IngestionGateway>,
}

impl AppState {
    /// Wire a hub and gateway around the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let hub = Arc::new(BroadcastHub::new());
        let gateway = Arc::new(IngestionGateway::new(Arc::clone(&hub), config.thresholds));
        Self {
            config: Arc::new(config),
            hub,
            gateway,
        }
    }
}
