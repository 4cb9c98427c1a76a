//! HTTP API for the Wardrobe service.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Emote endpoints** -- full snapshot, revision-gated long-poll, and
//!   per-player writes
//! - **Cape endpoints** -- snapshot and ownership-checked writes
//! - **Liveness** (`GET /`)
//!
//! # Architecture
//!
//! All handlers call into the [`WardrobeService`] held by [`AppState`].
//! The long-poll handler simply awaits the service; when a client
//! disconnects, Hyper drops the handler future, which unregisters the
//! observer and its deadline.
//!
//! [`WardrobeService`]: wardrobe_core::WardrobeService

pub mod capes;
pub mod emotes;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
