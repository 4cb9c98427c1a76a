//! Persistence layer for the Wardrobe service.
//!
//! The whole service state is one flat JSON document holding the cape
//! map, the emote map and the emote revision counter. In-memory state is
//! authoritative; the document is a best-effort snapshot used to recover
//! after a restart.
//!
//! # Architecture
//!
//! ```text
//! WardrobeService mutation
//!     |
//!     +-- submit(PersistedState) --> SnapshotWriter (watch channel)
//!                                        |
//!                                        +-- debounce, newest wins
//!                                        +-- SnapshotStore::save (blocking pool)
//!                                              |-- JsonFileStore (tmp + rename)
//!                                              +-- MemoryStore   (tests)
//! ```
//!
//! # Modules
//!
//! - [`document`] -- The persisted document and its legacy-tolerant decoder
//! - [`snapshot_store`] -- Storage backends
//! - [`writer`] -- Background flush task
//! - [`error`] -- Shared error types

pub mod document;
pub mod error;
pub mod snapshot_store;
pub mod writer;

// Re-export primary types for convenience.
pub use document::PersistedState;
pub use error::DbError;
pub use snapshot_store::{JsonFileStore, MemoryStore, SnapshotStore};
pub use writer::SnapshotWriter;
