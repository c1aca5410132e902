//! The fulfillment engine: one unit of work per transition.

use std::time::Instant;

use common::{OrderId, Sku};
use domain::{
    Allocation, LedgerEntry, OperationType, Order, OrderItem, OrderStatus, Stock,
    StockTransaction,
};
use store::FulfillmentStore;

use crate::command::{CreateOrder, FulfillOrder, PickOrder, ReceiveStock, ShipOrder};
use crate::error::{FulfillmentError, Result};
use crate::gateway::{GatewayError, ReservationGateway};

/// Reason string recorded on shipment stock movements.
const SHIPMENT_REASON: &str = "order shipment";

/// Default reason string for received stock.
const RECEIPT_REASON: &str = "stock receipt";

/// Drives orders through `Placed -> Reserved -> Picked -> Shipped`.
///
/// Every transition runs in a transaction from the store: the order row is
/// locked first, the precondition status checked, and all writes commit or
/// roll back together. An error from any step aborts the whole transition
/// and leaves the order exactly as it was.
pub struct FulfillmentEngine<S, G> {
    store: S,
    gateway: G,
}

impl<S, G> FulfillmentEngine<S, G>
where
    S: FulfillmentStore,
    G: ReservationGateway,
{
    /// Creates an engine over the given store and reservation gateway.
    pub fn new(store: S, gateway: G) -> Self {
        Self { store, gateway }
    }

    /// Gets a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a new order in `Placed` status.
    ///
    /// Resolves each line's SKU against the catalog and the target
    /// warehouse before writing anything; the order and its items are
    /// inserted in one transaction.
    #[tracing::instrument(skip(self, cmd), fields(customer = %cmd.customer_name))]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<Order> {
        if self.store.warehouse(cmd.warehouse_id).await?.is_none() {
            return Err(FulfillmentError::UnknownWarehouse(cmd.warehouse_id));
        }

        let mut items = Vec::with_capacity(cmd.items.len());
        for line in &cmd.items {
            let product = self
                .store
                .product_by_sku(&line.sku)
                .await?
                .ok_or_else(|| FulfillmentError::UnknownSku(line.sku.clone()))?;
            items.push(OrderItem::new(product.id, product.sku, line.qty));
        }

        let order = Order::place(cmd.customer_name, cmd.warehouse_id, cmd.created_by, items)?;

        let mut tx = self.store.begin().await?;
        match self.store.insert_order(&mut tx, &order).await {
            Ok(()) => {
                self.store.commit(tx).await?;
                metrics::counter!("orders_created_total").increment(1);
                tracing::info!(order_id = %order.id, "order placed");
                Ok(order)
            }
            Err(err) => {
                self.rollback_quietly(tx).await;
                Err(err.into())
            }
        }
    }

    /// Reserves every line of a `Placed` order through the gateway and
    /// moves it to `Reserved`.
    ///
    /// The first gateway failure aborts the transition: no allocation is
    /// persisted and the order stays `Placed`. The order lock is held
    /// across the gateway calls, so concurrent fulfills of the same order
    /// serialize.
    #[tracing::instrument(skip(self), fields(order_id = %cmd.order_id))]
    pub async fn fulfill_order(&self, cmd: FulfillOrder) -> Result<(Order, Vec<Allocation>)> {
        let mut tx = self.store.begin().await?;
        match self.fulfill_in_tx(&mut tx, cmd).await {
            Ok(out) => {
                self.store.commit(tx).await?;
                metrics::counter!("order_transitions_total", "transition" => "fulfill")
                    .increment(1);
                Ok(out)
            }
            Err(err) => {
                self.rollback_quietly(tx).await;
                metrics::counter!("fulfillment_failures_total", "transition" => "fulfill")
                    .increment(1);
                Err(err)
            }
        }
    }

    async fn fulfill_in_tx(
        &self,
        tx: &mut S::Tx,
        cmd: FulfillOrder,
    ) -> Result<(Order, Vec<Allocation>)> {
        let mut order = self
            .store
            .lock_order(tx, cmd.order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(cmd.order_id))?;

        if !order.status.can_reserve() {
            return Err(FulfillmentError::InvalidTransition {
                order_id: order.id,
                expected: OrderStatus::Placed,
                actual: order.status,
            });
        }

        let mut allocations = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let confirmation = self
                .gateway
                .reserve(&item.sku, item.qty, order.warehouse_id)
                .await
                .map_err(|reason| FulfillmentError::ReservationFailed {
                    sku: item.sku.clone(),
                    reason,
                })?;

            // An allocation must reserve something, and never more than
            // requested; a confirmation outside that range is a gateway
            // fault, not a reservation.
            if confirmation.reserved_qty <= 0 || confirmation.reserved_qty > item.qty {
                return Err(FulfillmentError::ReservationFailed {
                    sku: item.sku.clone(),
                    reason: GatewayError::Declined {
                        reason: format!(
                            "confirmed quantity {} outside 1..={}",
                            confirmation.reserved_qty, item.qty
                        ),
                    },
                });
            }

            let allocation = Allocation::new(&order, item, confirmation.reserved_qty);
            self.store.insert_allocation(tx, &allocation).await?;
            allocations.push(allocation);
        }

        self.store
            .update_order_status(tx, order.id, OrderStatus::Reserved)
            .await?;
        order.status = OrderStatus::Reserved;

        tracing::info!(order_id = %order.id, allocations = allocations.len(), "order reserved");
        Ok((order, allocations))
    }

    /// Moves a `Reserved` order to `Picked`. Touches no stock and calls no
    /// external system.
    #[tracing::instrument(skip(self), fields(order_id = %cmd.order_id))]
    pub async fn pick_order(&self, cmd: PickOrder) -> Result<Order> {
        let mut tx = self.store.begin().await?;
        match self.pick_in_tx(&mut tx, cmd).await {
            Ok(order) => {
                self.store.commit(tx).await?;
                metrics::counter!("order_transitions_total", "transition" => "pick").increment(1);
                Ok(order)
            }
            Err(err) => {
                self.rollback_quietly(tx).await;
                metrics::counter!("fulfillment_failures_total", "transition" => "pick")
                    .increment(1);
                Err(err)
            }
        }
    }

    async fn pick_in_tx(&self, tx: &mut S::Tx, cmd: PickOrder) -> Result<Order> {
        let mut order = self
            .store
            .lock_order(tx, cmd.order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(cmd.order_id))?;

        if !order.status.can_pick() {
            return Err(FulfillmentError::InvalidTransition {
                order_id: order.id,
                expected: OrderStatus::Reserved,
                actual: order.status,
            });
        }

        self.store
            .update_order_status(tx, order.id, OrderStatus::Picked)
            .await?;
        order.status = OrderStatus::Picked;
        Ok(order)
    }

    /// Ships a `Picked` order: decrements stock by each allocation's
    /// quantity, releases the reservation, appends one DELIVERY ledger row
    /// per allocation, and moves the order to `Shipped`.
    ///
    /// A shortfall on any allocation aborts the whole shipment: no SKU is
    /// decremented, no ledger row survives, and the order stays `Picked`.
    #[tracing::instrument(skip(self), fields(order_id = %cmd.order_id))]
    pub async fn ship_order(&self, cmd: ShipOrder) -> Result<Order> {
        let start = Instant::now();
        let mut tx = self.store.begin().await?;
        match self.ship_in_tx(&mut tx, cmd).await {
            Ok(order) => {
                self.store.commit(tx).await?;
                metrics::counter!("order_transitions_total", "transition" => "ship").increment(1);
                metrics::histogram!("ship_duration_seconds")
                    .record(start.elapsed().as_secs_f64());
                Ok(order)
            }
            Err(err) => {
                self.rollback_quietly(tx).await;
                metrics::counter!("fulfillment_failures_total", "transition" => "ship")
                    .increment(1);
                Err(err)
            }
        }
    }

    async fn ship_in_tx(&self, tx: &mut S::Tx, cmd: ShipOrder) -> Result<Order> {
        let mut order = self
            .store
            .lock_order(tx, cmd.order_id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(cmd.order_id))?;

        if !order.status.can_ship() {
            return Err(FulfillmentError::InvalidTransition {
                order_id: order.id,
                expected: OrderStatus::Picked,
                actual: order.status,
            });
        }

        let allocations = self.store.allocations_for_order(tx, order.id).await?;
        for allocation in &allocations {
            let stock = self.store.lock_stock(tx, &allocation.sku).await?;
            let on_hand = stock.map(|s| s.total_qty).unwrap_or(0);
            if on_hand < allocation.qty {
                return Err(FulfillmentError::InsufficientStock {
                    sku: allocation.sku.clone(),
                });
            }

            self.store
                .apply_stock_delta(tx, &allocation.sku, -allocation.qty, SHIPMENT_REASON)
                .await?;
            // Shipment consumes the reservation; saturates for orders that
            // never made a durable one (stub gateway path).
            self.store
                .release_reserved(tx, &allocation.sku, allocation.qty)
                .await?;

            let entry = LedgerEntry::delivery(
                allocation.product_id,
                allocation.warehouse_id,
                allocation.qty,
                order.id.as_uuid(),
                cmd.shipped_by,
            );
            self.store.append_ledger(tx, &entry).await?;
        }

        self.store
            .update_order_status(tx, order.id, OrderStatus::Shipped)
            .await?;
        order.status = OrderStatus::Shipped;

        tracing::info!(order_id = %order.id, allocations = allocations.len(), "order shipped");
        Ok(order)
    }

    /// Receives stock into a warehouse through the ledger-backed path:
    /// a positive stock delta plus a RECEIPT ledger row, in one transaction.
    #[tracing::instrument(skip(self, cmd), fields(sku = %cmd.sku, qty = cmd.qty))]
    pub async fn receive_stock(&self, cmd: ReceiveStock) -> Result<StockTransaction> {
        if cmd.qty <= 0 {
            return Err(FulfillmentError::Validation(format!(
                "received quantity must be positive, got {}",
                cmd.qty
            )));
        }

        let product = self
            .store
            .product_by_sku(&cmd.sku)
            .await?
            .ok_or_else(|| FulfillmentError::UnknownSku(cmd.sku.clone()))?;
        if self.store.warehouse(cmd.warehouse_id).await?.is_none() {
            return Err(FulfillmentError::UnknownWarehouse(cmd.warehouse_id));
        }

        let reason = cmd.reason.as_deref().unwrap_or(RECEIPT_REASON);
        let mut tx = self.store.begin().await?;
        let result: Result<StockTransaction> = async {
            let txn = self
                .store
                .apply_stock_delta(&mut tx, &cmd.sku, cmd.qty, reason)
                .await?;
            let entry = LedgerEntry::new(
                product.id,
                cmd.warehouse_id,
                cmd.qty,
                OperationType::Receipt,
                None,
                cmd.received_by,
            );
            self.store.append_ledger(&mut tx, &entry).await?;
            Ok(txn)
        }
        .await;

        match result {
            Ok(txn) => {
                self.store.commit(tx).await?;
                metrics::counter!("stock_receipts_total").increment(1);
                Ok(txn)
            }
            Err(err) => {
                self.rollback_quietly(tx).await;
                Err(err)
            }
        }
    }

    /// Loads an order with its items.
    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        self.store
            .get_order(id)
            .await?
            .ok_or(FulfillmentError::OrderNotFound(id))
    }

    /// Lists the allocations of an order.
    pub async fn allocations(&self, id: OrderId) -> Result<Vec<Allocation>> {
        if self.store.get_order(id).await?.is_none() {
            return Err(FulfillmentError::OrderNotFound(id));
        }
        Ok(self.store.get_allocations(id).await?)
    }

    /// Loads the stock row for a SKU, if any.
    pub async fn stock(&self, sku: &Sku) -> Result<Option<Stock>> {
        Ok(self.store.get_stock(sku).await?)
    }

    /// Lists the movement records of a SKU, oldest first.
    pub async fn stock_transactions(&self, sku: &Sku) -> Result<Vec<StockTransaction>> {
        Ok(self.store.stock_transactions(sku).await?)
    }

    async fn rollback_quietly(&self, tx: S::Tx) {
        if let Err(err) = self.store.rollback(tx).await {
            tracing::warn!(error = %err, "transaction rollback failed");
        }
    }
}
