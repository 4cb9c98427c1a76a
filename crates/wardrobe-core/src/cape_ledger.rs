//! Cape ledger: durable cosmetic records guarded by an ownership key.
//!
//! The first accepted write for an identity binds its `clientKey`; any
//! later write must present the same key. Writes replace the whole record.

use std::collections::BTreeMap;
use std::time::Duration;

use validator::Validate;
use wardrobe_types::records::default_cape_id;
use wardrobe_types::{CapeRecord, CapeWrite, PlayerId, Timestamp};

use crate::error::WardrobeError;
use crate::keyed_store::KeyedStore;

/// Cape records keyed by player.
#[derive(Debug, Clone)]
pub struct CapeLedger {
    store: KeyedStore<CapeRecord>,
    ttl: Duration,
}

impl CapeLedger {
    /// Create an empty ledger.
    pub const fn new(ttl: Duration) -> Self {
        Self::restore(BTreeMap::new(), ttl)
    }

    /// Rebuild a ledger from persisted records.
    pub const fn restore(records: BTreeMap<PlayerId, CapeRecord>, ttl: Duration) -> Self {
        Self {
            store: KeyedStore::from_map(records),
            ttl,
        }
    }

    /// Look up a single record.
    pub fn get(&self, id: &PlayerId) -> Option<&CapeRecord> {
        self.store.get(id)
    }

    /// Borrow the records.
    pub const fn records(&self) -> &BTreeMap<PlayerId, CapeRecord> {
        self.store.as_map()
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether no records are held.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Evict records not written within the TTL.
    pub fn sweep(&mut self, now: Timestamp) -> usize {
        self.store.sweep(now, self.ttl)
    }

    /// Validate and store a write for `id`.
    ///
    /// # Errors
    ///
    /// [`WardrobeError::Validation`] if the key is missing or too short,
    /// [`WardrobeError::Auth`] if a different key is already bound.
    pub fn write(&mut self, id: PlayerId, write: CapeWrite, now: Timestamp) -> Result<(), WardrobeError> {
        write.validate()?;
        let client_key = write.client_key.unwrap_or_default();

        let bound_key = self
            .store
            .get(&id)
            .map(|existing| existing.client_key.as_str())
            .filter(|key| !key.is_empty());
        if bound_key.is_some_and(|key| key != client_key) {
            return Err(WardrobeError::Auth("clientKey mismatch".to_owned()));
        }

        let record = CapeRecord {
            name: write.name.unwrap_or_default(),
            cape_id: write
                .cape_id
                .filter(|c| !c.is_empty())
                .unwrap_or_else(default_cape_id),
            custom_url: write.custom_url.unwrap_or_default(),
            enabled: write.enabled.unwrap_or(false),
            client_key,
            last_seen: write.last_seen.filter(|t| *t != 0).unwrap_or(now),
        };
        self.store.put(id, record);
        Ok(())
    }
}
