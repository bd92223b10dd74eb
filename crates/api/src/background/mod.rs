//! Background tasks.
//!
//! Each submodule provides a long-running task intended to be spawned via
//! `tokio::spawn`. All tasks accept a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! for graceful shutdown.

pub mod link;
