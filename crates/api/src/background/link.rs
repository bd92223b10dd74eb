//! In-process serial link.
//!
//! When a sensor board is attached to the server host, the link supervisor
//! runs inside the API process and feeds the ingestion gateway directly,
//! skipping the HTTP hop the standalone reader would make.

use std::sync::Arc;
use std::time::Duration;

use smartsense_link::config::{LinkConfig, PortSelection};
use smartsense_link::error::LinkError;
use smartsense_link::port;
use smartsense_link::supervisor::LinkSupervisor;
use smartsense_link::transport::SerialTransport;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::gateway::IngestionGateway;

/// How a link task ended once its owner asked it to stop.
#[derive(Debug)]
pub enum LinkExit {
    /// The supervisor observed the cancellation and returned cleanly.
    Stopped,
    /// The supervisor returned an error (e.g. the port could not be opened).
    Failed(LinkError),
    /// The task panicked or was aborted.
    Crashed(tokio::task::JoinError),
    /// The task did not finish within the grace period.
    TimedOut,
}

/// Resolve the configured port to a device path.
///
/// Returns `None` when the link is disabled or no candidate device exists.
pub fn resolve_port(selection: &PortSelection) -> Option<String> {
    match selection {
        PortSelection::Path(path) => Some(path.clone()),
        PortSelection::Detect => {
            let detected = port::detect_port();
            if detected.is_none() {
                tracing::warn!("No serial port detected, running without a sensor link");
            }
            detected
        }
        PortSelection::Disabled => {
            tracing::info!("Serial link disabled");
            None
        }
    }
}

/// Spawn the link supervisor if a port is available.
///
/// The task runs until `cancel` fires or the port cannot be opened. A
/// failed link is logged; the server keeps serving HTTP submissions.
pub fn spawn(
    config: LinkConfig,
    gateway: Arc<IngestionGateway>,
    cancel: CancellationToken,
) -> Option<JoinHandle<Result<(), LinkError>>> {
    let port_name = resolve_port(&config.port)?;

    tracing::info!(port = %port_name, baud = config.baud_rate, "Starting serial link");

    let transport = SerialTransport::new(port_name, config.baud_rate);
    let mut supervisor = LinkSupervisor::new(transport, config.supervisor);

    Some(tokio::spawn(async move {
        let result = supervisor.run(&gateway, &cancel).await;
        let stats = supervisor.stats();
        match &result {
            Ok(()) => tracing::info!(
                lines = stats.lines,
                forwarded = stats.forwarded,
                faults = stats.faults,
                reconnects = stats.reconnects,
                "Serial link stopped"
            ),
            Err(e) => tracing::error!(error = %e, "Serial link failed"),
        }
        result
    }))
}

/// Cancel the link task and wait up to `grace` for it to finish.
///
/// A task that already failed before the cancellation reports its error
/// here, so the owner can tell a fatal link failure from a clean stop.
pub async fn stop(
    handle: JoinHandle<Result<(), LinkError>>,
    cancel: &CancellationToken,
    grace: Duration,
) -> LinkExit {
    cancel.cancel();
    match tokio::time::timeout(grace, handle).await {
        Ok(Ok(Ok(()))) => LinkExit::Stopped,
        Ok(Ok(Err(e))) => LinkExit::Failed(e),
        Ok(Err(e)) => LinkExit::Crashed(e),
        Err(_) => LinkExit::TimedOut,
    }
}
