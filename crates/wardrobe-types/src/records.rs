//! Stored records and the snapshot shape served to observers.
//!
//! Field names are camelCase on the wire to match the game client and the
//! persisted document written by earlier deployments.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{PlayerId, Timestamp};

// ---------------------------------------------------------------------------
// Emotes
// ---------------------------------------------------------------------------

/// Transient animation state of a single player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct EmoteRecord {
    /// Display name last reported by the player.
    #[serde(default)]
    pub name: String,
    /// Emote kind (e.g. `wave`, `dance`). Kept after deactivation so
    /// observers can still show the last known emote.
    #[serde(rename = "type", default)]
    pub emote_type: String,
    /// Whether the emote is currently playing.
    #[serde(default = "default_true")]
    pub active: bool,
    /// When the current emote run started.
    #[serde(default)]
    #[ts(type = "number")]
    pub started_at: Timestamp,
    /// When the player last wrote this record.
    #[serde(default)]
    #[ts(type = "number")]
    pub last_seen: Timestamp,
}

impl EmoteRecord {
    /// Whether the record describes a running emote.
    ///
    /// A record flagged active but without a type is treated as idle.
    pub fn is_running(&self) -> bool {
        self.active && !self.emote_type.is_empty()
    }
}

/// Full view of the emote ledger at a given revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct EmoteSnapshot {
    /// Ledger revision this snapshot was taken at.
    #[ts(type = "number")]
    pub revision: u64,
    /// Server wall clock when the snapshot was taken, for client skew
    /// correction.
    #[ts(type = "number")]
    pub server_now: Timestamp,
    /// Every live emote record, ordered by identity.
    pub records: BTreeMap<PlayerId, EmoteRecord>,
}

// ---------------------------------------------------------------------------
// Capes
// ---------------------------------------------------------------------------

/// Durable cosmetic selection of a single player.
///
/// `client_key` is the ownership secret bound on first write. It is
/// persisted but never served back; see [`CapeView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapeRecord {
    /// Display name last reported by the player.
    #[serde(default)]
    pub name: String,
    /// Identifier of the selected cape asset.
    #[serde(default = "default_cape_id")]
    pub cape_id: String,
    /// Optional custom texture URL.
    #[serde(default)]
    pub custom_url: String,
    /// Whether the cape should be rendered.
    #[serde(default)]
    pub enabled: bool,
    /// Ownership secret bound to this identity.
    #[serde(default)]
    pub client_key: String,
    /// When the player last wrote this record.
    #[serde(default)]
    pub last_seen: Timestamp,
}

/// Public projection of a [`CapeRecord`], without the ownership secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CapeView {
    /// Display name last reported by the player.
    pub name: String,
    /// Identifier of the selected cape asset.
    pub cape_id: String,
    /// Optional custom texture URL.
    pub custom_url: String,
    /// Whether the cape should be rendered.
    pub enabled: bool,
    /// When the player last wrote this record.
    #[ts(type = "number")]
    pub last_seen: Timestamp,
}

impl From<&CapeRecord> for CapeView {
    fn from(record: &CapeRecord) -> Self {
        Self {
            name: record.name.clone(),
            cape_id: record.cape_id.clone(),
            custom_url: record.custom_url.clone(),
            enabled: record.enabled,
            last_seen: record.last_seen,
        }
    }
}

const fn default_true() -> bool {
    true
}

/// Cape identifier used when a write does not name one.
pub fn default_cape_id() -> String {
    "default".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn emote_record_uses_type_key() {
        let record = EmoteRecord {
            name: String::from("Steve"),
            emote_type: String::from("wave"),
            active: true,
            started_at: 10,
            last_seen: 20,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "wave");
        assert_eq!(json["startedAt"], 10);
        assert_eq!(json["lastSeen"], 20);
    }

    #[test]
    fn emote_record_missing_active_defaults_to_true() {
        let record: EmoteRecord = serde_json::from_str(r#"{"type":"wave"}"#).unwrap();
        assert!(record.active);
        assert!(record.is_running());
        assert_eq!(record.last_seen, 0);
    }

    #[test]
    fn active_record_without_type_is_not_running() {
        let record: EmoteRecord = serde_json::from_str(r#"{"active":true}"#).unwrap();
        assert!(!record.is_running());
    }

    #[test]
    fn cape_record_fills_defaults() {
        let record: CapeRecord = serde_json::from_str(r#"{"clientKey":"k"}"#).unwrap();
        assert_eq!(record.cape_id, "default");
        assert!(!record.enabled);
        assert_eq!(record.last_seen, 0);
    }

    #[test]
    fn cape_view_omits_client_key() {
        let record = CapeRecord {
            name: String::from("Alex"),
            cape_id: String::from("red"),
            custom_url: String::new(),
            enabled: true,
            client_key: String::from("0123456789abcdef"),
            last_seen: 5,
        };
        let json = serde_json::to_value(CapeView::from(&record)).unwrap();
        assert!(json.get("clientKey").is_none());
        assert_eq!(json["capeId"], "red");
    }
}
