use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{LedgerId, OrderId, ProductId, Sku, UserId, WarehouseId};
use domain::{
    Allocation, LedgerEntry, OperationType, Order, OrderItem, OrderStatus, Product, Stock,
    StockTransaction, Warehouse,
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::store::FulfillmentStore;
use crate::{Result, StoreError};

/// PostgreSQL-backed fulfillment store.
///
/// Row locks are taken with `SELECT ... FOR UPDATE`; the transaction handle
/// is a plain sqlx transaction, so every write made through it commits or
/// rolls back as one unit.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: &PgRow, items: Vec<OrderItem>) -> Result<Order> {
        let status: String = row.try_get("status")?;
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            customer_name: row.try_get("customer_name")?,
            warehouse_id: WarehouseId::from_uuid(row.try_get::<Uuid, _>("warehouse_id")?),
            status: status
                .parse::<OrderStatus>()
                .map_err(|e| StoreError::Decode(e.to_string()))?,
            created_by: UserId::from_uuid(row.try_get::<Uuid, _>("created_by")?),
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
            items,
        })
    }

    fn row_to_item(row: PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            id: row.try_get("id")?,
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            sku: Sku::from(row.try_get::<String, _>("sku")?),
            qty: row.try_get("qty")?,
        })
    }

    fn row_to_allocation(row: PgRow) -> Result<Allocation> {
        Ok(Allocation {
            id: row.try_get("id")?,
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            sku: Sku::from(row.try_get::<String, _>("sku")?),
            warehouse_id: WarehouseId::from_uuid(row.try_get::<Uuid, _>("warehouse_id")?),
            qty: row.try_get("qty")?,
        })
    }

    fn row_to_stock(row: PgRow) -> Result<Stock> {
        Ok(Stock {
            sku: Sku::from(row.try_get::<String, _>("sku")?),
            total_qty: row.try_get("total_qty")?,
            reserved_qty: row.try_get("reserved_qty")?,
            updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        })
    }

    fn row_to_stock_transaction(row: PgRow) -> Result<StockTransaction> {
        Ok(StockTransaction {
            id: row.try_get("id")?,
            sku: Sku::from(row.try_get::<String, _>("sku")?),
            delta: row.try_get("delta")?,
            reason: row.try_get("reason")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }

    fn row_to_ledger_entry(row: PgRow) -> Result<LedgerEntry> {
        let operation_type: String = row.try_get("operation_type")?;
        Ok(LedgerEntry {
            id: LedgerId::from_uuid(row.try_get::<Uuid, _>("id")?),
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            warehouse_id: WarehouseId::from_uuid(row.try_get::<Uuid, _>("warehouse_id")?),
            qty_change: row.try_get("qty_change")?,
            operation_type: operation_type
                .parse::<OperationType>()
                .map_err(|e| StoreError::Decode(e.to_string()))?,
            reference_id: row.try_get("reference_id")?,
            created_by: UserId::from_uuid(row.try_get::<Uuid, _>("created_by")?),
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }
}

const ORDER_COLUMNS: &str =
    "id, customer_name, warehouse_id, status, created_by, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, product_id, sku, qty";

#[async_trait]
impl FulfillmentStore for PostgresStore {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Tx> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: Self::Tx) -> Result<()> {
        Ok(tx.commit().await?)
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<()> {
        Ok(tx.rollback().await?)
    }

    async fn insert_order(&self, tx: &mut Self::Tx, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_name, warehouse_id, status, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(&order.customer_name)
        .bind(order.warehouse_id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.created_by.as_uuid())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut **tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, sku, qty) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(item.id)
            .bind(order.id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(item.sku.as_str())
            .bind(item.qty)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let item_sql = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1");
        let items = sqlx::query(&item_sql)
            .bind(id.as_uuid())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Self::row_to_item)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Self::row_to_order(&row, items)?))
    }

    async fn lock_order(&self, tx: &mut Self::Tx, id: OrderId) -> Result<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let item_sql = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1");
        let items = sqlx::query(&item_sql)
            .bind(id.as_uuid())
            .fetch_all(&mut **tx)
            .await?
            .into_iter()
            .map(Self::row_to_item)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Self::row_to_order(&row, items)?))
    }

    async fn update_order_status(
        &self,
        tx: &mut Self::Tx,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE orders SET status = $2, updated_at = now() WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(id));
        }
        Ok(())
    }

    async fn insert_allocation(&self, tx: &mut Self::Tx, allocation: &Allocation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO allocations (id, order_id, product_id, sku, warehouse_id, qty)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(allocation.id)
        .bind(allocation.order_id.as_uuid())
        .bind(allocation.product_id.as_uuid())
        .bind(allocation.sku.as_str())
        .bind(allocation.warehouse_id.as_uuid())
        .bind(allocation.qty)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn allocations_for_order(
        &self,
        tx: &mut Self::Tx,
        id: OrderId,
    ) -> Result<Vec<Allocation>> {
        sqlx::query(
            "SELECT id, order_id, product_id, sku, warehouse_id, qty FROM allocations WHERE order_id = $1",
        )
        .bind(id.as_uuid())
        .fetch_all(&mut **tx)
        .await?
        .into_iter()
        .map(Self::row_to_allocation)
        .collect()
    }

    async fn get_allocations(&self, id: OrderId) -> Result<Vec<Allocation>> {
        sqlx::query(
            "SELECT id, order_id, product_id, sku, warehouse_id, qty FROM allocations WHERE order_id = $1",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Self::row_to_allocation)
        .collect()
    }

    async fn get_stock(&self, sku: &Sku) -> Result<Option<Stock>> {
        let row = sqlx::query(
            "SELECT sku, total_qty, reserved_qty, updated_at FROM stock WHERE sku = $1",
        )
        .bind(sku.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_stock).transpose()
    }

    async fn lock_stock(&self, tx: &mut Self::Tx, sku: &Sku) -> Result<Option<Stock>> {
        let row = sqlx::query(
            "SELECT sku, total_qty, reserved_qty, updated_at FROM stock WHERE sku = $1 FOR UPDATE",
        )
        .bind(sku.as_str())
        .fetch_optional(&mut **tx)
        .await?;

        row.map(Self::row_to_stock).transpose()
    }

    async fn apply_stock_delta(
        &self,
        tx: &mut Self::Tx,
        sku: &Sku,
        delta: i64,
        reason: &str,
    ) -> Result<StockTransaction> {
        let current: Option<i64> =
            sqlx::query_scalar("SELECT total_qty FROM stock WHERE sku = $1 FOR UPDATE")
                .bind(sku.as_str())
                .fetch_optional(&mut **tx)
                .await?;

        let new_total = current.unwrap_or(0) + delta;
        if new_total < 0 {
            return Err(StoreError::NegativeStock { sku: sku.clone() });
        }

        sqlx::query(
            r#"
            INSERT INTO stock (sku, total_qty, reserved_qty, updated_at)
            VALUES ($1, $2, 0, now())
            ON CONFLICT (sku) DO UPDATE SET total_qty = $2, updated_at = now()
            "#,
        )
        .bind(sku.as_str())
        .bind(new_total)
        .execute(&mut **tx)
        .await?;

        let txn = StockTransaction::new(sku.clone(), delta, reason);
        sqlx::query(
            "INSERT INTO stock_transactions (id, sku, delta, reason, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(txn.id)
        .bind(txn.sku.as_str())
        .bind(txn.delta)
        .bind(&txn.reason)
        .bind(txn.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(txn)
    }

    async fn release_reserved(&self, tx: &mut Self::Tx, sku: &Sku, qty: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE stock
            SET reserved_qty = GREATEST(reserved_qty - $2, 0), updated_at = now()
            WHERE sku = $1
            "#,
        )
        .bind(sku.as_str())
        .bind(qty)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn stock_transactions(&self, sku: &Sku) -> Result<Vec<StockTransaction>> {
        sqlx::query(
            "SELECT id, sku, delta, reason, created_at FROM stock_transactions WHERE sku = $1 ORDER BY created_at ASC",
        )
        .bind(sku.as_str())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Self::row_to_stock_transaction)
        .collect()
    }

    async fn append_ledger(&self, tx: &mut Self::Tx, entry: &LedgerEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ledger (id, product_id, warehouse_id, qty_change, operation_type, reference_id, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.product_id.as_uuid())
        .bind(entry.warehouse_id.as_uuid())
        .bind(entry.qty_change)
        .bind(entry.operation_type.as_str())
        .bind(entry.reference_id)
        .bind(entry.created_by.as_uuid())
        .bind(entry.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn ledger_for_reference(&self, reference_id: Uuid) -> Result<Vec<LedgerEntry>> {
        sqlx::query(
            r#"
            SELECT id, product_id, warehouse_id, qty_change, operation_type, reference_id, created_by, created_at
            FROM ledger
            WHERE reference_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(reference_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Self::row_to_ledger_entry)
        .collect()
    }

    async fn product_by_sku(&self, sku: &Sku) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT id, sku, name, uom, created_at FROM products WHERE sku = $1")
            .bind(sku.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Product {
                id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
                sku: Sku::from(row.try_get::<String, _>("sku")?),
                name: row.try_get("name")?,
                uom: row.try_get("uom")?,
                created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            })),
            None => Ok(None),
        }
    }

    async fn warehouse(&self, id: WarehouseId) -> Result<Option<Warehouse>> {
        let row = sqlx::query("SELECT id, name, location, created_at FROM warehouses WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Warehouse {
                id: WarehouseId::from_uuid(row.try_get::<Uuid, _>("id")?),
                name: row.try_get("name")?,
                location: row.try_get("location")?,
                created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            })),
            None => Ok(None),
        }
    }

    async fn upsert_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, sku, name, uom, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (sku) DO UPDATE SET name = EXCLUDED.name, uom = EXCLUDED.uom
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.sku.as_str())
        .bind(&product.name)
        .bind(&product.uom)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_warehouse(&self, warehouse: &Warehouse) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO warehouses (id, name, location, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, location = EXCLUDED.location
            "#,
        )
        .bind(warehouse.id.as_uuid())
        .bind(&warehouse.name)
        .bind(&warehouse.location)
        .bind(warehouse.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
