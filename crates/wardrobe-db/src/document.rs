//! The persisted document: `{ capes, emotes, emotesRev }`.
//!
//! Decoding is forgiving. Files written by the first deployment contain
//! only the cape map at the top level, and later ones may lack the emote
//! fields. Individual records that fail to decode are
//! dropped rather than failing the whole load.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use wardrobe_types::{CapeRecord, EmoteRecord, PlayerId};

use crate::error::DbError;

/// Keys whose presence marks a document as the current layout.
const LAYOUT_KEYS: [&str; 3] = ["capes", "emotes", "emotesRev"];

/// Full service state as written to disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// Cape records keyed by player.
    pub capes: BTreeMap<PlayerId, CapeRecord>,
    /// Emote records keyed by player.
    pub emotes: BTreeMap<PlayerId, EmoteRecord>,
    /// Emote ledger revision at the time of the snapshot.
    pub emotes_rev: u64,
}

impl PersistedState {
    /// Decode a document, accepting the legacy and partial layouts.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] for invalid JSON and
    /// [`DbError::Malformed`] when the top level is not an object.
    pub fn from_json(raw: &str) -> Result<Self, DbError> {
        let value: Value = serde_json::from_str(raw)?;
        match value {
            Value::Object(root) => Ok(Self::from_object(&root)),
            Value::Null => Ok(Self::default()),
            other => Err(DbError::Malformed(format!(
                "expected an object at the top level, found {}",
                kind_of(&other)
            ))),
        }
    }

    /// Encode the document as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String, DbError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn from_object(root: &Map<String, Value>) -> Self {
        let current_layout = LAYOUT_KEYS.iter().any(|key| root.contains_key(*key));
        if !current_layout {
            // Legacy layout: the whole object is the cape map.
            return Self {
                capes: decode_map(root, "capes"),
                ..Self::default()
            };
        }

        let capes = match root.get("capes") {
            Some(Value::Object(map)) => decode_map(map, "capes"),
            _ => BTreeMap::new(),
        };
        let emotes = match root.get("emotes") {
            Some(Value::Object(map)) => decode_map(map, "emotes"),
            _ => BTreeMap::new(),
        };
        let emotes_rev = root.get("emotesRev").map_or(0, decode_revision);

        Self {
            capes,
            emotes,
            emotes_rev,
        }
    }
}

/// Decode every entry of `map`, skipping blank ids and bad records.
fn decode_map<T: DeserializeOwned>(map: &Map<String, Value>, section: &str) -> BTreeMap<PlayerId, T> {
    let mut out = BTreeMap::new();
    for (key, value) in map {
        let Some(id) = PlayerId::parse(key) else {
            tracing::warn!(section, "Dropping persisted record with blank id");
            continue;
        };
        match serde_json::from_value::<T>(value.clone()) {
            Ok(record) => {
                out.insert(id, record);
            }
            Err(e) => {
                tracing::warn!(section, id = %id, error = %e, "Dropping malformed persisted record");
            }
        }
    }
    out
}

/// Numbers and numeric strings are accepted; anything else reads as 0.
fn decode_revision(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
