//! Shared application state for the API server.

use wardrobe_core::config::HttpConfig;
use wardrobe_core::{WardrobeConfig, WardrobeService};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor. The service owns all mutable data and its own locking.
#[derive(Debug)]
pub struct AppState {
    /// Ledgers, notifier, and persistence handle.
    pub service: WardrobeService,
    /// Maximum accepted request body size in bytes.
    pub body_limit_bytes: usize,
}

impl AppState {
    /// Wrap a service with the HTTP limits from `http`.
    pub const fn new(service: WardrobeService, http: &HttpConfig) -> Self {
        Self {
            service,
            body_limit_bytes: http.body_limit_bytes,
        }
    }

    /// An in-memory state with default configuration, for tests and
    /// ephemeral runs.
    pub fn in_memory(config: &WardrobeConfig) -> Self {
        Self::new(WardrobeService::in_memory(config), &config.server)
    }
}
