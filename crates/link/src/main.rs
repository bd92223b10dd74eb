//! `smartsense-link` -- standalone serial reader.
//!
//! Reads sensor frames from the board's serial port and POSTs each reading
//! to the SmartSense server. Use this when the board is attached to a
//! different machine than the server; otherwise the server can run the
//! link in-process.
//!
//! # Environment variables
//!
//! | Variable      | Required | Default                      | Description                 |
//! |---------------|----------|------------------------------|-----------------------------|
//! | `BACKEND_URL` | no       | `http://localhost:8000/data` | Ingestion endpoint          |
//! | `SERIAL_PORT` | no       | auto-detect                  | Serial device path          |
//!
//! Timing variables are documented on [`LinkConfig::from_env`].

use smartsense_link::config::{LinkConfig, PortSelection};
use smartsense_link::port;
use smartsense_link::signal;
use smartsense_link::sink::HttpForwarder;
use smartsense_link::supervisor::LinkSupervisor;
use smartsense_link::transport::SerialTransport;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default ingestion endpoint of a locally running server.
const DEFAULT_BACKEND_URL: &str = "http://localhost:8000/data";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "smartsense_link=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = LinkConfig::from_env();
    let backend_url =
        std::env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());

    let port_name = match config.port.clone() {
        PortSelection::Path(path) => path,
        PortSelection::Detect => port::detect_port().unwrap_or_else(|| {
            tracing::error!("No serial port found, check the USB connection");
            std::process::exit(1);
        }),
        PortSelection::Disabled => {
            tracing::error!("SERIAL_PORT=none leaves the reader nothing to do");
            std::process::exit(1);
        }
    };

    let forwarder = HttpForwarder::new(&backend_url).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build HTTP client");
        std::process::exit(1);
    });

    tracing::info!(
        port = %port_name,
        baud = config.baud_rate,
        backend_url = %backend_url,
        "Starting smartsense-link",
    );

    let cancel = CancellationToken::new();
    tokio::spawn(signal::cancel_on(tokio::signal::ctrl_c(), cancel.clone()));

    let transport = SerialTransport::new(port_name, config.baud_rate);
    let mut supervisor = LinkSupervisor::new(transport, config.supervisor);

    let result = supervisor.run(&forwarder, &cancel).await;
    let stats = supervisor.stats();
    tracing::info!(
        lines = stats.lines,
        forwarded = stats.forwarded,
        faults = stats.faults,
        reconnects = stats.reconnects,
        "Sensor reader finished",
    );

    if let Err(e) = result {
        tracing::error!(error = %e, "Sensor link failed");
        std::process::exit(1);
    }
}
