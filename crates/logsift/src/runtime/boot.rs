//! Boot — logging init, config load, shutdown wiring.

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::SiftConfig;
use crate::error::SiftError;
use crate::runtime::stop;

/// Initialise the tracing / logging subsystem.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logsift=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load and validate config, and arm the Ctrl+C / SIGTERM handler.
///
/// Returns the config and the token that the handler cancels.
pub async fn boot() -> Result<(SiftConfig, CancellationToken), SiftError> {
    info!("Starting logsift v{}", env!("CARGO_PKG_VERSION"));

    let config = SiftConfig::load()?;
    config.validate().map_err(SiftError::Configuration)?;
    info!(
        root = %config.discovery.root.display(),
        pattern = %config.discovery.pattern,
        recursive = config.discovery.recursive,
        per_folder = config.output.per_folder,
        "Loaded configuration"
    );
    info!(
        "Pipeline: readers={}, hashers={}, chunk={}B, line queue={}",
        config.pipeline.reader_parallelism,
        config.pipeline.hash_parallelism,
        config.pipeline.chunk_size,
        config.pipeline.line_queue_capacity
    );

    let cancel = CancellationToken::new();
    tokio::spawn(stop::cancel_on_shutdown(cancel.clone()));

    Ok((config, cancel))
}
