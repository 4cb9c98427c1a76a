//! Emote ledger: per-player animation state plus the revision counter.
//!
//! Every accepted write replaces the player's record with a merge of the
//! previous record and the incoming fields, then advances the revision by
//! exactly one. Sweeps evict records whose `lastSeen` is older than the
//! configured TTL and do not touch the revision.
//!
//! # Merge rule
//!
//! | Field | Active write | Inactive write |
//! |-------|--------------|----------------|
//! | `type` | incoming if non-empty, else previous | previous if non-empty, else incoming |
//! | `startedAt` | now if the type changed or the previous record was idle, else previous | previous (now if none) |
//! | `name` | incoming if non-empty, else previous | same |
//! | `lastSeen` | now | now |

use std::collections::BTreeMap;
use std::time::Duration;

use wardrobe_types::{EmoteRecord, EmoteSnapshot, EmoteWrite, PlayerId, Timestamp};

use crate::keyed_store::KeyedStore;

/// Emote records and the revision that versions them.
#[derive(Debug, Clone)]
pub struct EmoteLedger {
    store: KeyedStore<EmoteRecord>,
    revision: u64,
    ttl: Duration,
}

impl EmoteLedger {
    /// Create an empty ledger at revision 0.
    pub const fn new(ttl: Duration) -> Self {
        Self::restore(BTreeMap::new(), 0, ttl)
    }

    /// Rebuild a ledger from persisted records and revision.
    pub const fn restore(records: BTreeMap<PlayerId, EmoteRecord>, revision: u64, ttl: Duration) -> Self {
        Self {
            store: KeyedStore::from_map(records),
            revision,
            ttl,
        }
    }

    /// Current revision.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Eviction TTL.
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a single record.
    pub fn get(&self, id: &PlayerId) -> Option<&EmoteRecord> {
        self.store.get(id)
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether no records are held.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Borrow the records.
    pub const fn records(&self) -> &BTreeMap<PlayerId, EmoteRecord> {
        self.store.as_map()
    }

    /// Apply an incoming write for `id` at time `now` and return the new
    /// revision.
    pub fn apply(&mut self, id: PlayerId, write: &EmoteWrite, now: Timestamp) -> u64 {
        let record = merge(self.store.get(&id), write, now);
        self.store.put(id, record);
        self.advance()
    }

    /// Advance the revision by one and return it.
    pub const fn advance(&mut self) -> u64 {
        self.revision = self.revision.saturating_add(1);
        self.revision
    }

    /// Evict stale records, returning how many were removed.
    pub fn sweep(&mut self, now: Timestamp) -> usize {
        self.store.sweep(now, self.ttl)
    }

    /// Full view at the current revision, stamped with `now`.
    pub fn snapshot(&self, now: Timestamp) -> EmoteSnapshot {
        EmoteSnapshot {
            revision: self.revision,
            server_now: now,
            records: self.store.to_map(),
        }
    }
}

/// Merge `write` into `prev` according to the transition rule.
fn merge(prev: Option<&EmoteRecord>, write: &EmoteWrite, now: Timestamp) -> EmoteRecord {
    let active = write.is_active();
    let incoming_type = write.emote_type.as_deref().unwrap_or_default();
    let incoming_name = write.name.as_deref().unwrap_or_default();

    let prev_type = prev.map_or("", |p| p.emote_type.as_str());
    let prev_name = prev.map_or("", |p| p.name.as_str());
    let prev_started = prev.map_or(0, |p| p.started_at);
    let was_running = prev.is_some_and(EmoteRecord::is_running);

    let emote_type = match (active, incoming_type.is_empty(), prev_type.is_empty()) {
        (true, false, _) | (false, _, true) => incoming_type,
        (true, true, _) | (false, _, false) => prev_type,
    };

    let type_changed = !emote_type.is_empty() && emote_type != prev_type;
    let started_at = if active && (type_changed || !was_running) {
        now
    } else if prev_started != 0 {
        prev_started
    } else {
        now
    };

    let name = if incoming_name.is_empty() {
        prev_name
    } else {
        incoming_name
    };

    EmoteRecord {
        name: name.to_owned(),
        emote_type: emote_type.to_owned(),
        active,
        started_at,
        last_seen: now,
    }
}
