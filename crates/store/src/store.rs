use async_trait::async_trait;
use common::{OrderId, Sku, WarehouseId};
use domain::{
    Allocation, LedgerEntry, Order, OrderStatus, Product, Stock, StockTransaction, Warehouse,
};
use uuid::Uuid;

use crate::Result;

/// Repository/unit-of-work abstraction over the fulfillment tables.
///
/// Transition-level operations run inside a transaction obtained from
/// [`begin`](FulfillmentStore::begin); all writes made through the same
/// handle commit or roll back together. `lock_order` and `lock_stock`
/// acquire exclusive row locks held until the transaction ends, which is
/// what serializes concurrent transitions on the same order or SKU.
///
/// Methods without a transaction parameter are plain reads (or collaborator
/// seeds) outside any unit of work.
#[async_trait]
pub trait FulfillmentStore: Send + Sync {
    /// Transaction handle; dropping it without commit discards all writes.
    type Tx: Send;

    async fn begin(&self) -> Result<Self::Tx>;
    async fn commit(&self, tx: Self::Tx) -> Result<()>;
    async fn rollback(&self, tx: Self::Tx) -> Result<()>;

    // -- Orders --

    /// Inserts an order together with its items.
    async fn insert_order(&self, tx: &mut Self::Tx, order: &Order) -> Result<()>;

    /// Loads an order with its items, without locking.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Loads an order with its items under an exclusive row lock.
    async fn lock_order(&self, tx: &mut Self::Tx, id: OrderId) -> Result<Option<Order>>;

    /// Updates the status of an existing order.
    async fn update_order_status(
        &self,
        tx: &mut Self::Tx,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<()>;

    // -- Allocations --

    async fn insert_allocation(&self, tx: &mut Self::Tx, allocation: &Allocation) -> Result<()>;

    /// Loads the allocations of an order inside a transaction.
    async fn allocations_for_order(
        &self,
        tx: &mut Self::Tx,
        id: OrderId,
    ) -> Result<Vec<Allocation>>;

    /// Loads the allocations of an order without a transaction.
    async fn get_allocations(&self, id: OrderId) -> Result<Vec<Allocation>>;

    // -- Stock ledger store --

    async fn get_stock(&self, sku: &Sku) -> Result<Option<Stock>>;

    /// Loads a stock row under an exclusive row lock.
    async fn lock_stock(&self, tx: &mut Self::Tx, sku: &Sku) -> Result<Option<Stock>>;

    /// Adjusts `total_qty` by a signed delta and appends a movement record.
    ///
    /// Creates the stock row on first positive delta. Fails with
    /// [`StoreError::NegativeStock`](crate::StoreError::NegativeStock) if
    /// the result would be negative; the store enforces only this floor,
    /// sufficiency checks are the caller's job.
    async fn apply_stock_delta(
        &self,
        tx: &mut Self::Tx,
        sku: &Sku,
        delta: i64,
        reason: &str,
    ) -> Result<StockTransaction>;

    /// Decreases `reserved_qty`, saturating at zero.
    ///
    /// `reserved_qty` is raised only by external inventory writers; the
    /// fulfillment pipeline merely consumes it at ship time, and orders
    /// reserved through the stub gateway have nothing durable to consume,
    /// hence the saturation.
    async fn release_reserved(&self, tx: &mut Self::Tx, sku: &Sku, qty: i64) -> Result<()>;

    /// Lists the movement records of a SKU, oldest first.
    async fn stock_transactions(&self, sku: &Sku) -> Result<Vec<StockTransaction>>;

    // -- Movement ledger --

    async fn append_ledger(&self, tx: &mut Self::Tx, entry: &LedgerEntry) -> Result<()>;

    /// Lists ledger entries referencing an originating operation.
    async fn ledger_for_reference(&self, reference_id: Uuid) -> Result<Vec<LedgerEntry>>;

    // -- Catalog / warehouse collaborators --

    async fn product_by_sku(&self, sku: &Sku) -> Result<Option<Product>>;
    async fn warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>>;
    async fn upsert_product(&self, product: &Product) -> Result<()>;
    async fn upsert_warehouse(&self, warehouse: &Warehouse) -> Result<()>;
}
