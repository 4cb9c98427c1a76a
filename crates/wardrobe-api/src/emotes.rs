//! Emote endpoints.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/emotes` | Full snapshot |
//! | `GET` | `/emotes/changes?sinceRev=N` | Long-poll for a newer revision |
//! | `PUT` | `/emotes/{id}` | Upsert one player's emote |
//! | `PUT` | `/emotes/changes` | Upsert for the player `changes` |
//!
//! Every snapshot response carries no-cache headers so intermediaries
//! never replay a stale revision.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::Deserialize;
use wardrobe_types::EmoteWrite;

use crate::error::ApiError;
use crate::handlers::{WriteAck, decode_body, no_store_json};
use crate::state::AppState;

/// Query parameters for `GET /emotes/changes`.
#[derive(Debug, Default, Deserialize)]
pub struct ChangesQuery {
    /// Last revision the client has seen. Kept as raw text so that
    /// malformed values degrade to `0` instead of failing the request.
    #[serde(rename = "sinceRev")]
    pub since_rev: Option<String>,
}

impl ChangesQuery {
    /// Parsed `sinceRev`; a missing value is revision `0`.
    pub fn since_rev(&self) -> SinceRev {
        self.since_rev
            .as_deref()
            .map_or(SinceRev::At(0), SinceRev::parse)
    }
}

/// Position a long-poll client reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinceRev {
    /// A negative value: behind every revision, including 0.
    Behind,
    /// The last revision seen, with any fractional part dropped.
    At(u64),
}

impl SinceRev {
    /// Read a decimal number the way the query is compared numerically.
    ///
    /// Anything that is not a plain decimal (empty, alphabetic, exponent
    /// notation) reads as `At(0)`. Integers too large for `u64` saturate.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (negative, unsigned) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };
        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
            return Self::At(0);
        }

        if negative {
            let nonzero = whole.bytes().chain(fraction.bytes()).any(|b| b != b'0');
            return if nonzero { Self::Behind } else { Self::At(0) };
        }
        if whole.is_empty() {
            return Self::At(0);
        }
        Self::At(whole.parse::<u64>().unwrap_or(u64::MAX))
    }
}

/// Player id that shares its path with the long-poll route.
const CHANGES_ID: &str = "changes";

/// `GET /emotes`
pub async fn get_emotes(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    no_store_json(&state.service.emote_snapshot())
}

/// `GET /emotes/changes`
///
/// Answers immediately when the client is behind, otherwise parks until
/// a write moves the revision or the long-poll timeout fires.
pub async fn get_emote_changes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChangesQuery>,
) -> Result<Response, ApiError> {
    let snapshot = match query.since_rev() {
        SinceRev::Behind => state.service.emote_snapshot(),
        SinceRev::At(since_rev) => state.service.await_emote_changes(since_rev).await,
    };
    no_store_json(&snapshot)
}

/// `PUT /emotes/{id}`
pub async fn put_emote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<WriteAck>, ApiError> {
    write_emote(&state, &id, &body)
}

/// `PUT /emotes/changes`
///
/// The static long-poll route wins over `/emotes/{id}` for this path, so
/// writes for the player `changes` land here.
pub async fn put_emote_changes(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<WriteAck>, ApiError> {
    write_emote(&state, CHANGES_ID, &body)
}

fn write_emote(state: &AppState, id: &str, body: &Bytes) -> Result<Json<WriteAck>, ApiError> {
    let write: EmoteWrite = decode_body(body)?;
    let revision = state.service.write_emote(id, &write)?;
    Ok(Json(WriteAck::at_revision(revision)))
}
