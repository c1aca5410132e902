//! Persistence layer for the fulfillment system.
//!
//! The [`FulfillmentStore`] trait is an explicit repository/unit-of-work
//! abstraction: every state-machine transition runs against a typed
//! transaction handle obtained from `begin`, and row locks are explicit
//! `lock_*` operations visible at the call site. Two implementations are
//! provided: an in-memory store for tests and offline use, and a
//! PostgreSQL store backed by sqlx.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use store::FulfillmentStore;
