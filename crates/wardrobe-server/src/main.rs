//! Wardrobe daemon.
//!
//! Serves the emote and cape API over HTTP, restoring state from the
//! JSON snapshot on start and flushing it again on exit.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (`WARDROBE_CONFIG` or `wardrobe.yaml`, then env)
//! 2. Initialize structured logging (tracing)
//! 3. Restore the snapshot document, tolerating absence or corruption
//! 4. Spawn the snapshot writer
//! 5. Serve HTTP until Ctrl-C or SIGTERM
//! 6. Flush the final snapshot

mod error;
mod shutdown;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use wardrobe_api::AppState;
use wardrobe_core::config::LoggingConfig;
use wardrobe_core::{SystemClock, WardrobeConfig, WardrobeService, load_snapshot};
use wardrobe_db::{JsonFileStore, SnapshotStore, SnapshotWriter};

use crate::error::DaemonError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the listener cannot
/// bind.
#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    // 1. Load configuration. Logging depends on it, so errors here go
    //    straight to stderr via the returned error.
    let config = WardrobeConfig::load()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);

    info!(
        host = config.server.host,
        port = config.server.port,
        data_file = %config.storage.data_file.display(),
        emote_ttl_secs = config.emotes.ttl_secs,
        long_poll_timeout_ms = config.emotes.long_poll_timeout_ms,
        notify_on_eviction = config.emotes.notify_on_eviction,
        "wardrobe-server starting"
    );

    // 3. Restore persisted state.
    let store: Arc<dyn SnapshotStore> = Arc::new(JsonFileStore::new(config.storage.data_file.clone()));
    let restored = load_snapshot(store.as_ref());

    // 4. Spawn the snapshot writer.
    let (writer, writer_task) = SnapshotWriter::spawn(store, config.storage.flush_debounce());
    let service = WardrobeService::restore(&config, restored, Arc::new(SystemClock), writer);
    let state = Arc::new(AppState::new(service, &config.server));

    // 5. Serve until a shutdown signal arrives.
    wardrobe_api::start_server(&config.server, Arc::clone(&state), shutdown::signal()).await?;

    // 6. Final flush. Everything submitted so far is on disk once this
    //    returns, so the writer task can be stopped outright.
    state.service.writer().flush().await;
    writer_task.abort();

    info!("wardrobe-server stopped");
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
