//! Background flush task for the persisted document.
//!
//! The service hands every post-mutation document to [`SnapshotWriter::submit`],
//! which never blocks. A single task picks up the newest document (older
//! ones are overwritten in the `watch` channel), optionally waits for a
//! debounce window, and saves it on the blocking pool. Failures are
//! logged and dropped: in-memory state stays authoritative.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::document::PersistedState;
use crate::error::DbError;
use crate::snapshot_store::SnapshotStore;

/// Handle used to queue documents for saving.
///
/// Cloning the handle shares the same channel and task. A disabled
/// writer accepts submissions and discards them.
#[derive(Clone)]
pub struct SnapshotWriter {
    inner: Option<Arc<WriterInner>>,
}

struct WriterInner {
    tx: watch::Sender<Option<PersistedState>>,
    store: Arc<dyn SnapshotStore>,
    /// Serializes saves so the task and `flush` never write concurrently.
    save_lock: Mutex<()>,
}

impl SnapshotWriter {
    /// A writer that persists nothing.
    pub const fn disabled() -> Self {
        Self { inner: None }
    }

    /// Spawn the flush task on the current Tokio runtime.
    ///
    /// With a zero `debounce` every submission is saved as soon as the
    /// task is scheduled; otherwise bursts within the window collapse
    /// into a single save of the newest document.
    pub fn spawn(store: Arc<dyn SnapshotStore>, debounce: Duration) -> (Self, JoinHandle<()>) {
        let (tx, rx) = watch::channel(None);
        let inner = Arc::new(WriterInner {
            tx,
            store,
            save_lock: Mutex::new(()),
        });
        let task = tokio::spawn(run(Arc::downgrade(&inner), rx, debounce));
        (Self { inner: Some(inner) }, task)
    }

    /// Whether submissions reach a store.
    pub const fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Queue `state` as the newest document to save.
    pub fn submit(&self, state: PersistedState) {
        if let Some(inner) = &self.inner {
            inner.tx.send_replace(Some(state));
        }
    }

    /// Save the newest submitted document now, bypassing the debounce.
    ///
    /// Used at shutdown. Errors are logged, not returned.
    pub async fn flush(&self) {
        if let Some(inner) = &self.inner {
            inner.save_latest().await;
        }
    }
}

impl core::fmt::Debug for SnapshotWriter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SnapshotWriter")
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

impl WriterInner {
    async fn save_latest(&self) {
        let _guard = self.save_lock.lock().await;
        // Read under the lock so a later save never writes an older document.
        let Some(state) = self.tx.borrow().clone() else {
            return;
        };
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || store.save(&state))
            .await
            .unwrap_or_else(|e| Err(DbError::Task(e.to_string())));
        match result {
            Ok(()) => debug!("Snapshot persisted"),
            Err(e) => warn!(error = %e, "Failed to persist snapshot"),
        }
    }
}

async fn run(
    inner: std::sync::Weak<WriterInner>,
    mut rx: watch::Receiver<Option<PersistedState>>,
    debounce: Duration,
) {
    while rx.changed().await.is_ok() {
        if !debounce.is_zero() {
            tokio::time::sleep(debounce).await;
        }
        rx.mark_unchanged();
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.save_latest().await;
    }
    debug!("Snapshot writer stopped");
}
