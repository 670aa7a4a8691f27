use tokio::signal;
use tokio::sync::watch;

/// Resolves on Ctrl+C or SIGTERM, then tells background tasks to stop so
/// they wind down while the server drains open requests.
pub(crate) async fn shutdown_signal(background: watch::Sender<bool>) {
    tokio::select! {
        _ = ctrl_c() => {},
        _ = terminate() => {},
    }

    tracing::info!("Shutdown signal received");
    if background.send(true).is_err() {
        tracing::debug!("Background tasks already stopped");
    }
}

async fn ctrl_c() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
