use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, Sku, WarehouseId};
use domain::{
    Allocation, LedgerEntry, Order, OrderStatus, Product, Stock, StockTransaction, Warehouse,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::store::FulfillmentStore;
use crate::{Result, StoreError};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    orders: HashMap<OrderId, Order>,
    allocations: HashMap<OrderId, Vec<Allocation>>,
    stock: HashMap<Sku, Stock>,
    stock_transactions: Vec<StockTransaction>,
    ledger: Vec<LedgerEntry>,
    products: HashMap<Sku, Product>,
    warehouses: HashMap<WarehouseId, Warehouse>,
}

/// In-memory store for tests and offline operation.
///
/// A transaction takes the single state mutex and mutates a staged copy;
/// commit writes the copy back, rollback (or drop) discards it. Holding the
/// mutex for the whole transaction serializes units of work, which
/// trivially satisfies the row-lock contract of the trait.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

/// Transaction handle of [`MemoryStore`].
pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of ledger entries stored.
    pub async fn ledger_len(&self) -> usize {
        self.state.lock().await.ledger.len()
    }

    /// Returns the number of movement records stored.
    pub async fn stock_transaction_len(&self) -> usize {
        self.state.lock().await.stock_transactions.len()
    }
}

#[async_trait]
impl FulfillmentStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<Self::Tx> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryTx { guard, staged })
    }

    async fn commit(&self, tx: Self::Tx) -> Result<()> {
        let MemoryTx { mut guard, staged } = tx;
        *guard = staged;
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<()> {
        drop(tx);
        Ok(())
    }

    async fn insert_order(&self, tx: &mut Self::Tx, order: &Order) -> Result<()> {
        tx.staged.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.lock().await.orders.get(&id).cloned())
    }

    async fn lock_order(&self, tx: &mut Self::Tx, id: OrderId) -> Result<Option<Order>> {
        // The state mutex held by the transaction is the lock.
        Ok(tx.staged.orders.get(&id).cloned())
    }

    async fn update_order_status(
        &self,
        tx: &mut Self::Tx,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<()> {
        let order = tx
            .staged
            .orders
            .get_mut(&id)
            .ok_or(StoreError::OrderNotFound(id))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_allocation(&self, tx: &mut Self::Tx, allocation: &Allocation) -> Result<()> {
        tx.staged
            .allocations
            .entry(allocation.order_id)
            .or_default()
            .push(allocation.clone());
        Ok(())
    }

    async fn allocations_for_order(
        &self,
        tx: &mut Self::Tx,
        id: OrderId,
    ) -> Result<Vec<Allocation>> {
        Ok(tx.staged.allocations.get(&id).cloned().unwrap_or_default())
    }

    async fn get_allocations(&self, id: OrderId) -> Result<Vec<Allocation>> {
        Ok(self
            .state
            .lock()
            .await
            .allocations
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_stock(&self, sku: &Sku) -> Result<Option<Stock>> {
        Ok(self.state.lock().await.stock.get(sku).cloned())
    }

    async fn lock_stock(&self, tx: &mut Self::Tx, sku: &Sku) -> Result<Option<Stock>> {
        Ok(tx.staged.stock.get(sku).cloned())
    }

    async fn apply_stock_delta(
        &self,
        tx: &mut Self::Tx,
        sku: &Sku,
        delta: i64,
        reason: &str,
    ) -> Result<StockTransaction> {
        let stock = tx
            .staged
            .stock
            .entry(sku.clone())
            .or_insert_with(|| Stock::empty(sku.clone()));

        let new_total = stock.total_qty + delta;
        if new_total < 0 {
            return Err(StoreError::NegativeStock { sku: sku.clone() });
        }
        stock.total_qty = new_total;
        stock.updated_at = Utc::now();

        let txn = StockTransaction::new(sku.clone(), delta, reason);
        tx.staged.stock_transactions.push(txn.clone());
        Ok(txn)
    }

    async fn release_reserved(&self, tx: &mut Self::Tx, sku: &Sku, qty: i64) -> Result<()> {
        if let Some(stock) = tx.staged.stock.get_mut(sku) {
            stock.reserved_qty = (stock.reserved_qty - qty).max(0);
            stock.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn stock_transactions(&self, sku: &Sku) -> Result<Vec<StockTransaction>> {
        Ok(self
            .state
            .lock()
            .await
            .stock_transactions
            .iter()
            .filter(|t| &t.sku == sku)
            .cloned()
            .collect())
    }

    async fn append_ledger(&self, tx: &mut Self::Tx, entry: &LedgerEntry) -> Result<()> {
        tx.staged.ledger.push(entry.clone());
        Ok(())
    }

    async fn ledger_for_reference(&self, reference_id: Uuid) -> Result<Vec<LedgerEntry>> {
        Ok(self
            .state
            .lock()
            .await
            .ledger
            .iter()
            .filter(|e| e.reference_id == Some(reference_id))
            .cloned()
            .collect())
    }

    async fn product_by_sku(&self, sku: &Sku) -> Result<Option<Product>> {
        Ok(self.state.lock().await.products.get(sku).cloned())
    }

    async fn warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>> {
        Ok(self.state.lock().await.warehouses.get(&id).cloned())
    }

    async fn upsert_product(&self, product: &Product) -> Result<()> {
        self.state
            .lock()
            .await
            .products
            .insert(product.sku.clone(), product.clone());
        Ok(())
    }

    async fn upsert_warehouse(&self, warehouse: &Warehouse) -> Result<()> {
        self.state
            .lock()
            .await
            .warehouses
            .insert(warehouse.id, warehouse.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ProductId, UserId};
    use domain::{OperationType, OrderItem};

    fn sample_order() -> Order {
        Order::place(
            "Acme Corp",
            WarehouseId::new(),
            UserId::new(),
            vec![OrderItem::new(ProductId::new(), Sku::from("SKU-001"), 5)],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_and_get_order() {
        let store = MemoryStore::new();
        let order = sample_order();

        let mut tx = store.begin().await.unwrap();
        store.insert_order(&mut tx, &order).await.unwrap();
        store.commit(tx).await.unwrap();

        let loaded = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(loaded.customer_name, "Acme Corp");
        assert_eq!(loaded.items.len(), 1);
    }

    #[tokio::test]
    async fn rollback_discards_writes() {
        let store = MemoryStore::new();
        let order = sample_order();

        let mut tx = store.begin().await.unwrap();
        store.insert_order(&mut tx, &order).await.unwrap();
        store.rollback(tx).await.unwrap();

        assert!(store.get_order(order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn drop_without_commit_discards_writes() {
        let store = MemoryStore::new();
        let sku = Sku::from("SKU-001");

        {
            let mut tx = store.begin().await.unwrap();
            store
                .apply_stock_delta(&mut tx, &sku, 10, "receipt")
                .await
                .unwrap();
            // tx dropped here
        }

        assert!(store.get_stock(&sku).await.unwrap().is_none());
        assert_eq!(store.stock_transaction_len().await, 0);
    }

    #[tokio::test]
    async fn apply_delta_creates_row_and_records_movement() {
        let store = MemoryStore::new();
        let sku = Sku::from("SKU-001");

        let mut tx = store.begin().await.unwrap();
        let txn = store
            .apply_stock_delta(&mut tx, &sku, 10, "receipt")
            .await
            .unwrap();
        store.commit(tx).await.unwrap();

        assert_eq!(txn.delta, 10);
        let stock = store.get_stock(&sku).await.unwrap().unwrap();
        assert_eq!(stock.total_qty, 10);
        let movements = store.stock_transactions(&sku).await.unwrap();
        assert_eq!(movements.len(), 1);
    }

    #[tokio::test]
    async fn apply_delta_rejects_negative_result() {
        let store = MemoryStore::new();
        let sku = Sku::from("SKU-001");

        let mut tx = store.begin().await.unwrap();
        store
            .apply_stock_delta(&mut tx, &sku, 5, "receipt")
            .await
            .unwrap();
        let result = store.apply_stock_delta(&mut tx, &sku, -6, "shipment").await;
        assert!(matches!(result, Err(StoreError::NegativeStock { .. })));
    }

    #[tokio::test]
    async fn release_reserved_saturates_at_zero() {
        let store = MemoryStore::new();
        let sku = Sku::from("SKU-001");

        let mut tx = store.begin().await.unwrap();
        store
            .apply_stock_delta(&mut tx, &sku, 5, "receipt")
            .await
            .unwrap();
        // Nothing durable was reserved, so releasing must not underflow.
        store.release_reserved(&mut tx, &sku, 10).await.unwrap();
        store.commit(tx).await.unwrap();

        let stock = store.get_stock(&sku).await.unwrap().unwrap();
        assert_eq!(stock.reserved_qty, 0);
        assert_eq!(stock.total_qty, 5);
    }

    #[tokio::test]
    async fn update_status_of_missing_order_fails() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let result = store
            .update_order_status(&mut tx, OrderId::new(), OrderStatus::Reserved)
            .await;
        assert!(matches!(result, Err(StoreError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn ledger_lookup_by_reference() {
        let store = MemoryStore::new();
        let order_id = Uuid::new_v4();
        let entry = LedgerEntry::delivery(
            ProductId::new(),
            WarehouseId::new(),
            5,
            order_id,
            UserId::new(),
        );

        let mut tx = store.begin().await.unwrap();
        store.append_ledger(&mut tx, &entry).await.unwrap();
        store.commit(tx).await.unwrap();

        let entries = store.ledger_for_reference(order_id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].qty_change, -5);
        assert_eq!(entries[0].operation_type, OperationType::Delivery);
        assert!(store
            .ledger_for_reference(Uuid::new_v4())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn transactions_serialize_on_the_state_lock() {
        let store = MemoryStore::new();
        let sku = Sku::from("SKU-001");

        let mut tx = store.begin().await.unwrap();
        store
            .apply_stock_delta(&mut tx, &sku, 10, "receipt")
            .await
            .unwrap();

        // A second transaction must wait until the first commits.
        let store2 = store.clone();
        let sku2 = sku.clone();
        let waiter = tokio::spawn(async move {
            let mut tx2 = store2.begin().await.unwrap();
            let stock = store2.lock_stock(&mut tx2, &sku2).await.unwrap();
            store2.commit(tx2).await.unwrap();
            stock
        });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        store.commit(tx).await.unwrap();
        let stock = waiter.await.unwrap().unwrap();
        assert_eq!(stock.total_qty, 10);
    }

    #[tokio::test]
    async fn product_and_warehouse_seeding() {
        let store = MemoryStore::new();
        let product = Product::new("SKU-001", "Widget", "piece");
        let warehouse = Warehouse::new("Main", Some("Dock 4".to_string()));

        store.upsert_product(&product).await.unwrap();
        store.upsert_warehouse(&warehouse).await.unwrap();

        let loaded = store
            .product_by_sku(&Sku::from("SKU-001"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.name, "Widget");
        assert!(store.warehouse(warehouse.id).await.unwrap().is_some());
        assert!(store
            .product_by_sku(&Sku::from("SKU-404"))
            .await
            .unwrap()
            .is_none());
    }
}
