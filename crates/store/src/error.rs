use common::{OrderId, Sku};
use thiserror::Error;

/// Errors that can occur when interacting with the fulfillment store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Applying a delta would take a stock level below zero.
    #[error("stock for SKU {sku} cannot go negative")]
    NegativeStock { sku: Sku },

    /// The order row was not found for an update.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A persisted value could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
