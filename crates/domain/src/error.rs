//! Domain error types.

use common::Sku;
use thiserror::Error;

/// Errors raised while validating an order at creation time.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order has no items.
    #[error("order must contain at least one item")]
    EmptyItems,

    /// An item quantity is not positive.
    #[error("quantity for SKU {sku} must be positive, got {qty}")]
    InvalidQuantity { sku: Sku, qty: i64 },

    /// The customer name is empty.
    #[error("customer name must not be empty")]
    EmptyCustomerName,
}

/// Error returned when a persisted enum value cannot be parsed back.
#[derive(Debug, Error)]
#[error("invalid {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}
