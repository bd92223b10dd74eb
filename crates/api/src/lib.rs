//! SmartSense API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! ingestion gateway, WebSocket broadcast hub, background link task) so
//! integration tests and the binary entrypoint can both access them.

pub mod background;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
