//! Errors surfaced to callers of the ledgers.
//!
//! Persistence failures never reach a caller; the snapshot writer logs
//! them.

/// Errors a write can be rejected with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WardrobeError {
    /// A required field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// The ownership key does not match the one bound to the identity.
    #[error("{0}")]
    Auth(String),
}

impl From<validator::ValidationErrors> for WardrobeError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .find_map(|e| e.message.as_ref().map(ToString::to_string))
            .unwrap_or_else(|| errors.to_string());
        Self::Validation(message)
    }
}
