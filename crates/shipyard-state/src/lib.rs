//! shipyard-state — entity store for Shipyard.
//!
//! Holds `Deployment` and `Service` records in a [redb](https://docs.rs/redb)
//! database on the in-memory backend. State lives for the lifetime of the
//! process; nothing is written to disk.
//!
//! # Architecture
//!
//! Records are JSON-serialized into redb's `&[u8]` value columns, keyed by
//! their id. Every mutation is a read-modify-write inside a single write
//! transaction, and redb admits one writer at a time, so concurrent writers
//! (an API request and a rollout step) are serialized without lost updates.
//! Cross-table invariants (service → deployment references, cascade delete)
//! are checked and applied within one transaction.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
