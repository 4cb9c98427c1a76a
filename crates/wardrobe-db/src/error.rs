//! Error types for the persistence layer.
//!
//! None of these ever reach an API caller: the writer logs and drops
//! them, and a failed load falls back to an empty state.

/// Errors that can occur while reading or writing the snapshot document.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The document parsed as JSON but has an unusable shape.
    #[error("Malformed document: {0}")]
    Malformed(String),

    /// The blocking save task panicked or was cancelled.
    #[error("Save task failed: {0}")]
    Task(String),
}
