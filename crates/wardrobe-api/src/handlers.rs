//! Shared handler plumbing: the liveness route, JSON body decoding, and
//! cache-suppressing responses.

use axum::body::Bytes;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;

/// `GET /` -- liveness probe.
pub async fn index() -> &'static str {
    "ok"
}

/// Acknowledgement returned by the write endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WriteAck {
    /// Always `true`; failures are reported through [`ApiError`].
    pub ok: bool,
    /// Emote revision after the write. Absent for capes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
}

impl WriteAck {
    /// Acknowledge a write that carries no revision.
    pub const fn ok() -> Self {
        Self {
            ok: true,
            revision: None,
        }
    }

    /// Acknowledge an emote write at `revision`.
    pub const fn at_revision(revision: u64) -> Self {
        Self {
            ok: true,
            revision: Some(revision),
        }
    }
}

/// Decode a request body as a JSON object.
///
/// An empty body and a literal `null` both decode to `T::default()`.
/// Anything that is not an object, or an object with ill-typed fields,
/// is rejected.
///
/// # Errors
///
/// [`ApiError::InvalidBody`] when the body is not acceptable JSON.
pub fn decode_body<T>(body: &Bytes) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::InvalidBody(format!("malformed JSON: {e}")))?;
    match value {
        Value::Null => Ok(T::default()),
        Value::Object(_) => serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidBody(format!("unexpected field value: {e}"))),
        _ => Err(ApiError::InvalidBody(String::from(
            "body must be a JSON object",
        ))),
    }
}

/// Serialize `body` as JSON with headers that forbid any caching.
///
/// # Errors
///
/// [`ApiError::Serialization`] if `body` fails to serialize.
pub fn no_store_json<T: Serialize>(body: &T) -> Result<Response, ApiError> {
    let bytes = serde_json::to_vec(body)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, "no-cache, no-store, max-age=0"),
            (header::PRAGMA, "no-cache"),
        ],
        bytes,
    )
        .into_response())
}
