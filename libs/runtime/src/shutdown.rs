use anyhow::Result;
use tokio_util::sync::CancellationToken;

/// Resolves when the process is asked to stop; returns the signal name.
pub async fn wait_for_shutdown() -> Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?; // Ctrl+C
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv()  => "SIGINT",
        };
        Ok(name)
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok("ctrl-c")
    }
}

/// Cancel `token` on the first shutdown signal. Returns immediately.
pub fn cancel_on_signal(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => tracing::info!(signal, "shutdown requested"),
            Err(e) => tracing::error!(error = %e, "signal handler failed; shutting down"),
        }
        token.cancel();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn token_stays_live_without_signal() {
        let token = CancellationToken::new();
        let handle = cancel_on_signal(token.clone());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!token.is_cancelled());

        handle.abort();
    }
}
