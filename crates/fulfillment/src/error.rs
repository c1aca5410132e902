use common::{OrderId, Sku, WarehouseId};
use domain::{OrderError, OrderStatus};
use store::StoreError;
use thiserror::Error;

use crate::gateway::GatewayError;

/// Errors produced by fulfillment engine operations.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// A command failed input validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A requested SKU does not exist in the catalog.
    #[error("unknown SKU: {0}")]
    UnknownSku(Sku),

    /// The referenced warehouse does not exist.
    #[error("unknown warehouse: {0}")]
    UnknownWarehouse(WarehouseId),

    /// The order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order is not in the status the transition requires.
    #[error("order {order_id} cannot transition: expected {expected}, was {actual}")]
    InvalidTransition {
        order_id: OrderId,
        expected: OrderStatus,
        actual: OrderStatus,
    },

    /// The reservation gateway declined or could not be reached.
    #[error("reservation failed for SKU {sku}: {reason}")]
    ReservationFailed { sku: Sku, reason: GatewayError },

    /// Stock on hand is less than the allocated shipment quantity.
    #[error("insufficient stock for SKU {sku}")]
    InsufficientStock { sku: Sku },

    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<OrderError> for FulfillmentError {
    fn from(err: OrderError) -> Self {
        FulfillmentError::Validation(err.to_string())
    }
}

/// Result type for fulfillment operations.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
