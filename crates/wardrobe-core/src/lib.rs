//! Core state machines for the Wardrobe service.
//!
//! Two kinds of per-player state are tracked:
//!
//! - **Emotes** -- short-lived animation state. Every accepted write
//!   advances a process-wide revision, and long-poll observers waiting on
//!   an older revision are woken with a fresh snapshot.
//! - **Capes** -- durable cosmetic selections guarded by a per-player
//!   ownership key (first write wins).
//!
//! # Architecture
//!
//! ```text
//! WardrobeService (one Mutex = the single mutation path)
//!     |-- EmoteLedger   (KeyedStore<EmoteRecord> + revision counter)
//!     |-- ChangeNotifier (pending long-poll waiters)
//!     |-- CapeLedger    (KeyedStore<CapeRecord> + ownership check)
//!     +-- SnapshotWriter (best-effort persistence, off the request path)
//! ```
//!
//! # Modules
//!
//! - [`clock`] -- Wall-clock abstraction (system and manual)
//! - [`config`] -- YAML configuration with environment overrides
//! - [`keyed_store`] -- Identity-keyed map with TTL sweeps
//! - [`emote_ledger`] -- Emote transition rule and revision counter
//! - [`notifier`] -- Long-poll waiter registry
//! - [`cape_ledger`] -- Cape writes with ownership enforcement
//! - [`service`] -- The injectable service object tying it together
//! - [`error`] -- Caller-facing error taxonomy

pub mod cape_ledger;
pub mod clock;
pub mod config;
pub mod emote_ledger;
pub mod error;
pub mod keyed_store;
pub mod notifier;
pub mod service;

pub use cape_ledger::CapeLedger;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, WardrobeConfig};
pub use emote_ledger::EmoteLedger;
pub use error::WardrobeError;
pub use keyed_store::{Expiring, KeyedStore};
pub use notifier::{ChangeNotifier, WaiterId};
pub use service::{WardrobeService, load_snapshot};
