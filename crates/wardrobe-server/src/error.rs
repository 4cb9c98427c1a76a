//! Error types for the Wardrobe daemon.
//!
//! [`DaemonError`] is the top-level error type that wraps all possible
//! failure modes during startup and serving.

/// Top-level error for the daemon binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: wardrobe_core::ConfigError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: wardrobe_api::ServerError,
    },
}
