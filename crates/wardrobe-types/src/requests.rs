//! Write payloads accepted from clients.
//!
//! Every field is optional on the wire; the ledgers decide how absent
//! fields merge with the stored record.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use validator::Validate;

use crate::ids::Timestamp;

/// Minimum length of a cape ownership key, in characters.
pub const MIN_CLIENT_KEY_LEN: u64 = 16;

/// Body of an emote write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct EmoteWrite {
    /// Display name; empty or absent keeps the stored name.
    #[serde(default)]
    pub name: Option<String>,
    /// Emote kind; empty or absent keeps the stored type.
    #[serde(rename = "type", default)]
    pub emote_type: Option<String>,
    /// Whether the emote is playing. Absent means `true`.
    #[serde(default)]
    pub active: Option<bool>,
}

impl EmoteWrite {
    /// Resolved activity flag: only an explicit `false` deactivates.
    pub fn is_active(&self) -> bool {
        self.active != Some(false)
    }
}

/// Body of a cape write. Replaces the whole stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CapeWrite {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Selected cape asset; defaults to `default`.
    #[serde(default)]
    pub cape_id: Option<String>,
    /// Custom texture URL.
    #[serde(default)]
    pub custom_url: Option<String>,
    /// Whether the cape is rendered; defaults to `false`.
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Ownership secret, bound to the identity on first write.
    #[serde(default)]
    #[validate(
        required(message = "missing clientKey"),
        length(min = MIN_CLIENT_KEY_LEN, message = "clientKey must be at least 16 characters")
    )]
    pub client_key: Option<String>,
    /// Client-reported last-seen time; absent or zero means "now".
    #[serde(default)]
    #[ts(type = "number | null")]
    pub last_seen: Option<Timestamp>,
}
