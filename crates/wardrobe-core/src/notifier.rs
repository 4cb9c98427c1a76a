//! Registry of pending long-poll observers.
//!
//! An observer registers the last revision it has seen and receives a
//! one-shot channel. When the ledger advances past that revision the
//! observer is removed from the registry and then sent the fresh
//! snapshot. Removal is the only way out of the registry -- resolution,
//! deadline expiry, and client disconnect all go through it -- so a
//! waiter is answered at most once.
//!
//! The registry itself is not synchronized; the owning service holds it
//! under the same lock as the emote ledger.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::oneshot;
use wardrobe_types::EmoteSnapshot;

/// Handle naming a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaiterId(u64);

/// Receiving half handed to a registered observer.
pub type WaiterReceiver = oneshot::Receiver<Arc<EmoteSnapshot>>;

#[derive(Debug)]
struct Waiter {
    since_rev: u64,
    tx: oneshot::Sender<Arc<EmoteSnapshot>>,
}

/// Pending observers keyed by [`WaiterId`].
#[derive(Debug, Default)]
pub struct ChangeNotifier {
    waiters: HashMap<WaiterId, Waiter>,
    next_id: u64,
}

impl ChangeNotifier {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer that has seen `since_rev`.
    pub fn register(&mut self, since_rev: u64) -> (WaiterId, WaiterReceiver) {
        let id = WaiterId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let (tx, rx) = oneshot::channel();
        self.waiters.insert(id, Waiter { since_rev, tx });
        (id, rx)
    }

    /// Remove an observer without answering it.
    ///
    /// Returns `false` if it had already been resolved or cancelled.
    pub fn cancel(&mut self, id: WaiterId) -> bool {
        self.waiters.remove(&id).is_some()
    }

    /// Resolve every observer whose `since_rev` is behind `revision`.
    ///
    /// `snapshot` is only built if at least one observer is due, and is
    /// shared between all of them. Returns the number of observers that
    /// were still listening.
    pub fn resolve(&mut self, revision: u64, snapshot: impl FnOnce() -> EmoteSnapshot) -> usize {
        let due: Vec<WaiterId> = self
            .waiters
            .iter()
            .filter(|(_, waiter)| waiter.since_rev < revision)
            .map(|(id, _)| *id)
            .collect();
        if due.is_empty() {
            return 0;
        }

        let snapshot = Arc::new(snapshot());
        let mut delivered: usize = 0;
        for id in due {
            let Some(waiter) = self.waiters.remove(&id) else {
                continue;
            };
            if waiter.tx.send(Arc::clone(&snapshot)).is_ok() {
                delivered = delivered.saturating_add(1);
            }
        }
        delivered
    }

    /// Number of observers still waiting.
    pub fn pending(&self) -> usize {
        self.waiters.len()
    }

    /// Whether `id` is still waiting.
    pub fn is_pending(&self, id: WaiterId) -> bool {
        self.waiters.contains_key(&id)
    }
}
