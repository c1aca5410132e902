//! Commands accepted by the fulfillment engine.

use common::{OrderId, Sku, UserId, WarehouseId};
use serde::{Deserialize, Serialize};

/// One requested line of a new order, by SKU.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub sku: Sku,
    pub qty: i64,
}

/// Creates an order in `Placed` status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    pub customer_name: String,
    pub warehouse_id: WarehouseId,
    pub items: Vec<OrderLine>,
    pub created_by: UserId,
}

/// Reserves every line of a `Placed` order through the gateway.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FulfillOrder {
    pub order_id: OrderId,
}

/// Marks a `Reserved` order as `Picked`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PickOrder {
    pub order_id: OrderId,
}

/// Ships a `Picked` order, decrementing stock and writing the ledger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ShipOrder {
    pub order_id: OrderId,
    pub shipped_by: UserId,
}

/// Receives stock into a warehouse through the ledger-backed entry path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiveStock {
    pub sku: Sku,
    pub warehouse_id: WarehouseId,
    pub qty: i64,
    pub reason: Option<String>,
    pub received_by: UserId,
}
