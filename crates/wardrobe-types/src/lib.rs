//! Shared type definitions for the Wardrobe service.
//!
//! This crate is the single source of truth for the records exchanged
//! between the game client and the service. Types defined here flow
//! downstream to `TypeScript` via `ts-rs` so the client overlay can share
//! the exact wire shapes.
//!
//! # Modules
//!
//! - [`ids`] -- Opaque player identity wrapper and timestamp alias
//! - [`records`] -- Stored records (`EmoteRecord`, `CapeRecord`) and snapshots
//! - [`requests`] -- Write payloads accepted from clients

pub mod ids;
pub mod records;
pub mod requests;

// Re-export all public types at crate root for convenience.
pub use ids::{PlayerId, Timestamp};
pub use records::{CapeRecord, CapeView, EmoteRecord, EmoteSnapshot};
pub use requests::{CapeWrite, EmoteWrite, MIN_CLIENT_KEY_LEN};
