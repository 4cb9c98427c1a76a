//! Error types for the HTTP layer.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use wardrobe_core::WardrobeError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A write was rejected by a ledger.
    #[error(transparent)]
    Wardrobe(#[from] WardrobeError),

    /// The request body is not a JSON object of the expected shape.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// A serialization error while building a response.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Wardrobe(WardrobeError::Validation(_)) | Self::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Wardrobe(WardrobeError::Auth(_)) => StatusCode::FORBIDDEN,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Wardrobe(e) => e.to_string(),
            Self::InvalidBody(msg) => msg.clone(),
            Self::Serialization(e) => format!("JSON error: {e}"),
        };
        if status.is_server_error() {
            tracing::error!(%status, error = %message, "Request failed");
        }

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
