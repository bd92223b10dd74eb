//! Shutdown signal wiring for the standalone reader.

use std::future::Future;

use tokio_util::sync::CancellationToken;

/// Cancel `cancel` once `signal` fires.
///
/// If the signal handler cannot be installed the token is left alone: the
/// reader keeps running and must be stopped by terminating the process.
pub async fn cancel_on<F>(signal: F, cancel: CancellationToken)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            tracing::info!("Received Ctrl-C, stopping sensor reader");
            cancel.cancel();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler, reader keeps running");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivered_signal_cancels() {
        let cancel = CancellationToken::new();

        cancel_on(std::future::ready(Ok(())), cancel.clone()).await;

        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn handler_install_failure_leaves_token_alone() {
        let cancel = CancellationToken::new();
        let failed = std::future::ready(Err(std::io::Error::other("no signal support")));

        cancel_on(failed, cancel.clone()).await;

        assert!(!cancel.is_cancelled());
    }
}
