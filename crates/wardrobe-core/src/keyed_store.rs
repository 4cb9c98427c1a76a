//! Identity-keyed record storage with TTL sweeps.
//!
//! [`KeyedStore`] is the shared container behind both ledgers. It does no
//! locking of its own; the owning service serializes every access.

use std::collections::BTreeMap;
use std::time::Duration;

use wardrobe_types::{CapeRecord, EmoteRecord, PlayerId, Timestamp};

/// A record that carries the time it was last written.
pub trait Expiring {
    /// Last write time; zero means unknown.
    fn last_seen(&self) -> Timestamp;

    /// Whether the record should be evicted at `now` given `ttl_ms`.
    ///
    /// Records with an unknown last-seen time are always stale.
    fn is_stale(&self, now: Timestamp, ttl_ms: i64) -> bool {
        let last_seen = self.last_seen();
        last_seen == 0 || now.saturating_sub(last_seen) > ttl_ms
    }
}

impl Expiring for EmoteRecord {
    fn last_seen(&self) -> Timestamp {
        self.last_seen
    }
}

impl Expiring for CapeRecord {
    fn last_seen(&self) -> Timestamp {
        self.last_seen
    }
}

/// Convert a TTL to whole milliseconds, saturating.
pub fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

/// Mapping from player identity to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedStore<R> {
    records: BTreeMap<PlayerId, R>,
}

impl<R> Default for KeyedStore<R> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }
}

impl<R> KeyedStore<R> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `records`.
    pub const fn from_map(records: BTreeMap<PlayerId, R>) -> Self {
        Self { records }
    }

    /// Look up a record.
    pub fn get(&self, id: &PlayerId) -> Option<&R> {
        self.records.get(id)
    }

    /// Insert or replace a record, returning the previous one.
    pub fn put(&mut self, id: PlayerId, record: R) -> Option<R> {
        self.records.insert(id, record)
    }

    /// Remove a record, returning it if present.
    pub fn delete(&mut self, id: &PlayerId) -> Option<R> {
        self.records.remove(id)
    }

    /// Visit every record in identity order.
    pub fn for_each(&self, mut f: impl FnMut(&PlayerId, &R)) {
        for (id, record) in &self.records {
            f(id, record);
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Borrow the underlying map.
    pub const fn as_map(&self) -> &BTreeMap<PlayerId, R> {
        &self.records
    }
}

impl<R: Clone> KeyedStore<R> {
    /// Clone the whole map out of the store.
    pub fn to_map(&self) -> BTreeMap<PlayerId, R> {
        self.records.clone()
    }
}

impl<R: Expiring> KeyedStore<R> {
    /// Evict every record that is stale at `now`, returning how many were
    /// removed.
    pub fn sweep(&mut self, now: Timestamp, ttl: Duration) -> usize {
        let ttl_ms = ttl_millis(ttl);
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_stale(now, ttl_ms));
        before.saturating_sub(self.records.len())
    }
}
