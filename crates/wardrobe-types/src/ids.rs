//! Player identity and time representation.
//!
//! A [`PlayerId`] is an opaque string chosen by the client (in practice a
//! player or session UUID). The service never interprets it beyond
//! trimming surrounding whitespace.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Milliseconds since the Unix epoch.
///
/// Zero is reserved to mean "never seen" on records restored from disk.
pub type Timestamp = i64;

/// Opaque identity of a player, used as the key for both emote and cape
/// records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerId(String);

impl PlayerId {
    /// Build an identity from raw input, trimming whitespace.
    ///
    /// Returns `None` when nothing is left after trimming.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    /// Borrow the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
