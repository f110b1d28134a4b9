//! Stop — turn process signals into pipeline cancellation.

use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Wait for Ctrl+C (or SIGTERM on unix) and cancel `token`.
///
/// If no handler can be installed the run simply cannot be interrupted;
/// the token is left alone.
pub async fn cancel_on_shutdown(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, cancelling run...");
        },
        _ = terminate => {
            warn!("Received SIGTERM, cancelling run...");
        },
        _ = token.cancelled() => return,
    }

    token.cancel();
}
