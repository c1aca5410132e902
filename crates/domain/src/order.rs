//! Order aggregate and its owned records.

use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, Sku, UserId, WarehouseId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrderError;
use crate::status::OrderStatus;

/// A single line of an order: a product and a positive quantity.
///
/// Items are created atomically with the order and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: ProductId,
    pub sku: Sku,
    pub qty: i64,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(product_id: ProductId, sku: Sku, qty: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            sku,
            qty,
        }
    }
}

/// Aggregate root of the fulfillment pipeline.
///
/// The item list is fixed at placement; only `status` and `updated_at`
/// change afterwards, and only through the fulfillment engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub warehouse_id: WarehouseId,
    pub status: OrderStatus,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Places a new order in `Placed` status.
    ///
    /// Validates that the customer name is non-empty, at least one item is
    /// present, and every quantity is positive. SKU resolution is the
    /// caller's responsibility.
    pub fn place(
        customer_name: impl Into<String>,
        warehouse_id: WarehouseId,
        created_by: UserId,
        items: Vec<OrderItem>,
    ) -> Result<Self, OrderError> {
        let customer_name = customer_name.into();
        if customer_name.trim().is_empty() {
            return Err(OrderError::EmptyCustomerName);
        }
        if items.is_empty() {
            return Err(OrderError::EmptyItems);
        }
        for item in &items {
            if item.qty <= 0 {
                return Err(OrderError::InvalidQuantity {
                    sku: item.sku.clone(),
                    qty: item.qty,
                });
            }
        }

        let now = Utc::now();
        Ok(Self {
            id: OrderId::new(),
            customer_name,
            warehouse_id,
            status: OrderStatus::Placed,
            created_by,
            created_at: now,
            updated_at: now,
            items,
        })
    }

    /// Returns the total quantity across all items.
    pub fn total_qty(&self) -> i64 {
        self.items.iter().map(|item| item.qty).sum()
    }
}

/// A committed reservation of stock quantity against one order line.
///
/// Created only during the Reserve transition, one per order item, with the
/// gateway-confirmed quantity (which may be less than requested). Read back
/// during the Ship transition to know exactly what to decrement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub id: Uuid,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub sku: Sku,
    pub warehouse_id: WarehouseId,
    pub qty: i64,
}

impl Allocation {
    /// Creates an allocation for one order line.
    pub fn new(order: &Order, item: &OrderItem, reserved_qty: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id: order.id,
            product_id: item.product_id,
            sku: item.sku.clone(),
            warehouse_id: order.warehouse_id,
            qty: reserved_qty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(sku: &str, qty: i64) -> OrderItem {
        OrderItem::new(ProductId::new(), Sku::from(sku), qty)
    }

    #[test]
    fn test_place_order() {
        let order = Order::place(
            "Acme Corp",
            WarehouseId::new(),
            UserId::new(),
            vec![item("SKU-001", 5)],
        )
        .unwrap();

        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.total_qty(), 5);
    }

    #[test]
    fn test_place_order_without_items_fails() {
        let result = Order::place("Acme Corp", WarehouseId::new(), UserId::new(), vec![]);
        assert!(matches!(result, Err(OrderError::EmptyItems)));
    }

    #[test]
    fn test_place_order_with_zero_qty_fails() {
        let result = Order::place(
            "Acme Corp",
            WarehouseId::new(),
            UserId::new(),
            vec![item("SKU-001", 0)],
        );
        assert!(matches!(result, Err(OrderError::InvalidQuantity { .. })));
    }

    #[test]
    fn test_place_order_with_blank_customer_fails() {
        let result = Order::place(
            "   ",
            WarehouseId::new(),
            UserId::new(),
            vec![item("SKU-001", 1)],
        );
        assert!(matches!(result, Err(OrderError::EmptyCustomerName)));
    }

    #[test]
    fn test_allocation_copies_order_line() {
        let order = Order::place(
            "Acme Corp",
            WarehouseId::new(),
            UserId::new(),
            vec![item("SKU-001", 5)],
        )
        .unwrap();

        let allocation = Allocation::new(&order, &order.items[0], 3);
        assert_eq!(allocation.order_id, order.id);
        assert_eq!(allocation.sku, order.items[0].sku);
        assert_eq!(allocation.warehouse_id, order.warehouse_id);
        assert_eq!(allocation.qty, 3);
    }

    #[test]
    fn test_order_serialization_roundtrip() {
        let order = Order::place(
            "Acme Corp",
            WarehouseId::new(),
            UserId::new(),
            vec![item("SKU-001", 2), item("SKU-002", 3)],
        )
        .unwrap();

        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.id, order.id);
        assert_eq!(deserialized.items.len(), 2);
        assert_eq!(deserialized.total_qty(), 5);
    }
}
