//! Audit ledger of stock movements with their originating operation.

use chrono::{DateTime, Utc};
use common::{LedgerId, ProductId, UserId, WarehouseId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ParseEnumError;

/// The kind of operation that caused a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    Receipt,
    Delivery,
    Transfer,
    Adjustment,
}

impl OperationType {
    /// Returns the persisted name, matching the wire format.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Receipt => "RECEIPT",
            OperationType::Delivery => "DELIVERY",
            OperationType::Transfer => "TRANSFER",
            OperationType::Adjustment => "ADJUSTMENT",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OperationType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RECEIPT" => Ok(OperationType::Receipt),
            "DELIVERY" => Ok(OperationType::Delivery),
            "TRANSFER" => Ok(OperationType::Transfer),
            "ADJUSTMENT" => Ok(OperationType::Adjustment),
            other => Err(ParseEnumError {
                kind: "OperationType",
                value: other.to_string(),
            }),
        }
    }
}

/// Immutable audit record of one stock quantity change.
///
/// `qty_change` is signed; `reference_id` points at the originating
/// order/receipt/delivery/transfer when there is one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerId,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub qty_change: i64,
    pub operation_type: OperationType,
    pub reference_id: Option<Uuid>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Creates a ledger entry.
    pub fn new(
        product_id: ProductId,
        warehouse_id: WarehouseId,
        qty_change: i64,
        operation_type: OperationType,
        reference_id: Option<Uuid>,
        created_by: UserId,
    ) -> Self {
        Self {
            id: LedgerId::new(),
            product_id,
            warehouse_id,
            qty_change,
            operation_type,
            reference_id,
            created_by,
            created_at: Utc::now(),
        }
    }

    /// Creates a DELIVERY entry for an order shipment, referencing the order.
    pub fn delivery(
        product_id: ProductId,
        warehouse_id: WarehouseId,
        qty: i64,
        order_id: Uuid,
        created_by: UserId,
    ) -> Self {
        Self::new(
            product_id,
            warehouse_id,
            -qty,
            OperationType::Delivery,
            Some(order_id),
            created_by,
        )
    }
}
