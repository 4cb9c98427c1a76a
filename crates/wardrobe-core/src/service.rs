//! The injectable service object owning all Wardrobe state.
//!
//! [`WardrobeService`] holds both ledgers and the change notifier behind a
//! single mutex. Every write, sweep, observer registration, resolution and
//! cancellation takes that lock, which is what makes "each observer is
//! answered exactly once" hold on a multi-threaded runtime. No lock is
//! ever held across an `.await`.
//!
//! Persistence is a side effect: after each accepted mutation the full
//! document is handed to the [`SnapshotWriter`], which saves it off the
//! request path.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};
use wardrobe_db::{PersistedState, SnapshotStore, SnapshotWriter};
use wardrobe_types::{CapeRecord, CapeWrite, EmoteSnapshot, EmoteWrite, PlayerId, Timestamp};

use crate::cape_ledger::CapeLedger;
use crate::clock::{Clock, SystemClock};
use crate::config::WardrobeConfig;
use crate::emote_ledger::EmoteLedger;
use crate::error::WardrobeError;
use crate::notifier::{ChangeNotifier, WaiterId, WaiterReceiver};

/// Everything guarded by the service lock.
#[derive(Debug)]
struct LedgerState {
    emotes: EmoteLedger,
    notifier: ChangeNotifier,
    capes: CapeLedger,
}

impl LedgerState {
    /// Wake every observer behind the current revision.
    fn notify_observers(&mut self, now: Timestamp) -> usize {
        let revision = self.emotes.revision();
        let emotes = &self.emotes;
        self.notifier.resolve(revision, || emotes.snapshot(now))
    }

    fn persisted(&self) -> PersistedState {
        PersistedState {
            capes: self.capes.records().clone(),
            emotes: self.emotes.records().clone(),
            emotes_rev: self.emotes.revision(),
        }
    }
}

/// Shared service state for emotes and capes.
pub struct WardrobeService {
    state: Mutex<LedgerState>,
    clock: Arc<dyn Clock>,
    writer: SnapshotWriter,
    notify_on_eviction: bool,
    long_poll_timeout: Duration,
}

impl WardrobeService {
    /// Create a service with empty ledgers.
    pub fn new(config: &WardrobeConfig, clock: Arc<dyn Clock>, writer: SnapshotWriter) -> Self {
        Self::restore(config, PersistedState::default(), clock, writer)
    }

    /// Create a service from a previously persisted document.
    pub fn restore(
        config: &WardrobeConfig,
        restored: PersistedState,
        clock: Arc<dyn Clock>,
        writer: SnapshotWriter,
    ) -> Self {
        let PersistedState {
            capes,
            emotes,
            emotes_rev,
        } = restored;
        Self {
            state: Mutex::new(LedgerState {
                emotes: EmoteLedger::restore(emotes, emotes_rev, config.emotes.ttl()),
                notifier: ChangeNotifier::new(),
                capes: CapeLedger::restore(capes, config.capes.ttl()),
            }),
            clock,
            writer,
            notify_on_eviction: config.emotes.notify_on_eviction,
            long_poll_timeout: config.emotes.long_poll_timeout(),
        }
    }

    /// An empty service on the system clock that persists nothing.
    pub fn in_memory(config: &WardrobeConfig) -> Self {
        Self::new(config, Arc::new(SystemClock), SnapshotWriter::disabled())
    }

    /// Configured long-poll hold time.
    pub const fn long_poll_timeout(&self) -> Duration {
        self.long_poll_timeout
    }

    /// The persistence handle, for flushing at shutdown.
    pub const fn writer(&self) -> &SnapshotWriter {
        &self.writer
    }

    /// Current emote revision.
    pub fn revision(&self) -> u64 {
        self.lock().emotes.revision()
    }

    /// Number of long-poll observers currently parked.
    pub fn pending_observers(&self) -> usize {
        self.lock().notifier.pending()
    }

    /// Copy of the full document as it would be persisted now.
    pub fn persisted_state(&self) -> PersistedState {
        self.lock().persisted()
    }

    // =====================================================================
    // Emotes
    // =====================================================================

    /// Sweep stale emotes, then return the full snapshot.
    pub fn emote_snapshot(&self) -> EmoteSnapshot {
        let now = self.clock.now_ms();
        let mut state = self.lock();
        self.sweep_emotes(&mut state, now);
        state.emotes.snapshot(now)
    }

    /// Apply an emote write and return the new revision.
    ///
    /// # Errors
    ///
    /// [`WardrobeError::Validation`] if `raw_id` is blank.
    pub fn write_emote(&self, raw_id: &str, write: &EmoteWrite) -> Result<u64, WardrobeError> {
        let id = parse_id(raw_id)?;
        let now = self.clock.now_ms();
        let mut state = self.lock();
        let revision = state.emotes.apply(id.clone(), write, now);
        let woken = state.notify_observers(now);
        self.persist(&state);
        drop(state);

        debug!(id = %id, revision, woken, "Emote write accepted");
        Ok(revision)
    }

    /// Long-poll using the configured timeout. See
    /// [`Self::await_emote_changes_for`].
    pub async fn await_emote_changes(&self, since_rev: u64) -> EmoteSnapshot {
        self.await_emote_changes_for(since_rev, self.long_poll_timeout)
            .await
    }

    /// Wait until the revision moves past `since_rev` or `timeout` elapses.
    ///
    /// Returns immediately if the caller is already behind. Otherwise the
    /// caller is parked as an observer and answered with the first
    /// snapshot whose revision exceeds `since_rev`, or with the unchanged
    /// snapshot once `timeout` elapses. Dropping the returned future (the
    /// client went away) unregisters the observer and its deadline.
    pub async fn await_emote_changes_for(&self, since_rev: u64, timeout: Duration) -> EmoteSnapshot {
        let (id, mut rx) = {
            let now = self.clock.now_ms();
            let mut state = self.lock();
            self.sweep_emotes(&mut state, now);
            if since_rev < state.emotes.revision() {
                return state.emotes.snapshot(now);
            }
            state.notifier.register(since_rev)
        };
        let mut guard = WaiterGuard {
            service: self,
            id: Some(id),
        };

        let outcome = tokio::time::timeout(timeout, &mut rx).await;
        guard.disarm();
        match outcome {
            Ok(Ok(snapshot)) => unshare(snapshot),
            Ok(Err(_)) => self.current_snapshot(),
            Err(_) => self.expire_waiter(id, &mut rx),
        }
    }

    /// Deadline path: remove the waiter, or pick up the snapshot a
    /// concurrent write already delivered.
    fn expire_waiter(&self, id: WaiterId, rx: &mut WaiterReceiver) -> EmoteSnapshot {
        let now = self.clock.now_ms();
        let mut state = self.lock();
        if state.notifier.cancel(id) {
            debug!(revision = state.emotes.revision(), "Long-poll timed out");
            return state.emotes.snapshot(now);
        }
        drop(state);
        rx.try_recv()
            .map_or_else(|_| self.current_snapshot(), unshare)
    }

    fn current_snapshot(&self) -> EmoteSnapshot {
        let now = self.clock.now_ms();
        self.lock().emotes.snapshot(now)
    }

    /// Evict stale emotes. In eviction-notify mode a non-empty sweep
    /// counts as a change and wakes observers.
    fn sweep_emotes(&self, state: &mut LedgerState, now: Timestamp) {
        let evicted = state.emotes.sweep(now);
        if evicted == 0 {
            return;
        }
        if self.notify_on_eviction {
            let revision = state.emotes.advance();
            let woken = state.notify_observers(now);
            debug!(evicted, revision, woken, "Emote sweep advanced revision");
        } else {
            debug!(evicted, "Emote sweep");
        }
        self.persist(state);
    }

    // =====================================================================
    // Capes
    // =====================================================================

    /// Sweep stale capes, then return every record.
    pub fn cape_snapshot(&self) -> BTreeMap<PlayerId, CapeRecord> {
        let now = self.clock.now_ms();
        let mut state = self.lock();
        let evicted = state.capes.sweep(now);
        if evicted > 0 {
            debug!(evicted, "Cape sweep");
            self.persist(&state);
        }
        state.capes.records().clone()
    }

    /// Validate and store a cape write.
    ///
    /// # Errors
    ///
    /// [`WardrobeError::Validation`] for a blank id or a missing/short
    /// key, [`WardrobeError::Auth`] when the key does not match.
    pub fn write_cape(&self, raw_id: &str, write: CapeWrite) -> Result<(), WardrobeError> {
        let id = parse_id(raw_id)?;
        let now = self.clock.now_ms();
        let mut state = self.lock();
        state.capes.write(id.clone(), write, now)?;
        self.persist(&state);
        drop(state);

        debug!(id = %id, "Cape write accepted");
        Ok(())
    }

    // =====================================================================
    // Internals
    // =====================================================================

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, state: &LedgerState) {
        if self.writer.is_enabled() {
            self.writer.submit(state.persisted());
        }
    }
}

impl core::fmt::Debug for WardrobeService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WardrobeService")
            .field("writer", &self.writer)
            .field("notify_on_eviction", &self.notify_on_eviction)
            .field("long_poll_timeout", &self.long_poll_timeout)
            .finish_non_exhaustive()
    }
}

/// Unregisters a parked observer if its future is dropped early.
struct WaiterGuard<'a> {
    service: &'a WardrobeService,
    id: Option<WaiterId>,
}

impl WaiterGuard<'_> {
    const fn disarm(&mut self) {
        self.id = None;
    }
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if self.service.lock().notifier.cancel(id) {
            debug!("Long-poll observer disconnected");
        }
    }
}

/// Load the persisted document, falling back to an empty state.
///
/// A missing document is normal on first start; an unreadable one is
/// logged and ignored rather than aborting startup.
pub fn load_snapshot(store: &dyn SnapshotStore) -> PersistedState {
    match store.load() {
        Ok(Some(state)) => {
            info!(
                capes = state.capes.len(),
                emotes = state.emotes.len(),
                revision = state.emotes_rev,
                "Restored snapshot"
            );
            state
        }
        Ok(None) => {
            info!("No snapshot found, starting empty");
            PersistedState::default()
        }
        Err(e) => {
            warn!(error = %e, "Snapshot unreadable, starting empty");
            PersistedState::default()
        }
    }
}

fn parse_id(raw: &str) -> Result<PlayerId, WardrobeError> {
    PlayerId::parse(raw).ok_or_else(|| WardrobeError::Validation("missing uuid".to_owned()))
}

fn unshare(snapshot: Arc<EmoteSnapshot>) -> EmoteSnapshot {
    Arc::try_unwrap(snapshot).unwrap_or_else(|shared| (*shared).clone())
}
