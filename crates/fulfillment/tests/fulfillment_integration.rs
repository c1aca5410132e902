//! End-to-end engine tests over the in-memory store.
//!
//! These exercise the full pipeline and its failure modes: strict
//! transition order, atomic aborts on gateway and stock failures, exact
//! stock decrements with ledger rows, and concurrency safety.

use std::sync::Arc;

use common::{Sku, UserId};
use domain::{OperationType, OrderStatus, Product, Warehouse};
use fulfillment::{
    CreateOrder, FlakyGateway, FulfillOrder, FulfillmentEngine, FulfillmentError, OrderLine,
    PickOrder, ReceiveStock, ReservationGateway, ShipOrder, StubGateway,
};
use store::{FulfillmentStore, MemoryStore};

async fn seed_catalog(store: &MemoryStore, skus: &[&str]) -> Warehouse {
    let warehouse = Warehouse::new("Main".to_string(), Some("Dock 4".to_string()));
    store.upsert_warehouse(&warehouse).await.unwrap();
    for sku in skus {
        let product = Product::new(
            Sku::from(*sku),
            format!("Product {sku}"),
            "unit".to_string(),
        );
        store.upsert_product(&product).await.unwrap();
    }
    warehouse
}

async fn seed_stock<G: ReservationGateway>(
    engine: &FulfillmentEngine<MemoryStore, G>,
    warehouse: &Warehouse,
    sku: &str,
    qty: i64,
) {
    engine
        .receive_stock(ReceiveStock {
            sku: Sku::from(sku),
            warehouse_id: warehouse.id,
            qty,
            reason: None,
            received_by: UserId::new(),
        })
        .await
        .unwrap();
}

fn order_cmd(warehouse: &Warehouse, lines: &[(&str, i64)]) -> CreateOrder {
    CreateOrder {
        customer_name: "Acme Corp".to_string(),
        warehouse_id: warehouse.id,
        items: lines
            .iter()
            .map(|(sku, qty)| OrderLine {
                sku: Sku::from(*sku),
                qty: *qty,
            })
            .collect(),
        created_by: UserId::new(),
    }
}

#[tokio::test]
async fn test_out_of_order_transitions_fail_and_change_nothing() {
    let store = MemoryStore::new();
    let warehouse = seed_catalog(&store, &["SKU-001"]).await;
    let engine = FulfillmentEngine::new(store, StubGateway::new());
    seed_stock(&engine, &warehouse, "SKU-001", 10).await;

    let order = engine
        .create_order(order_cmd(&warehouse, &[("SKU-001", 5)]))
        .await
        .unwrap();
    let shipper = UserId::new();

    // Ship and pick both require earlier transitions first.
    let result = engine
        .ship_order(ShipOrder {
            order_id: order.id,
            shipped_by: shipper,
        })
        .await;
    assert!(matches!(
        result,
        Err(FulfillmentError::InvalidTransition { .. })
    ));
    let result = engine.pick_order(PickOrder { order_id: order.id }).await;
    assert!(matches!(
        result,
        Err(FulfillmentError::InvalidTransition { .. })
    ));
    assert_eq!(
        engine.get_order(order.id).await.unwrap().status,
        OrderStatus::Placed
    );

    // Walk the pipeline, then verify no transition can repeat.
    engine
        .fulfill_order(FulfillOrder { order_id: order.id })
        .await
        .unwrap();
    let result = engine
        .fulfill_order(FulfillOrder { order_id: order.id })
        .await;
    assert!(matches!(
        result,
        Err(FulfillmentError::InvalidTransition {
            expected: OrderStatus::Placed,
            actual: OrderStatus::Reserved,
            ..
        })
    ));

    engine.pick_order(PickOrder { order_id: order.id }).await.unwrap();
    engine
        .ship_order(ShipOrder {
            order_id: order.id,
            shipped_by: shipper,
        })
        .await
        .unwrap();

    let result = engine
        .ship_order(ShipOrder {
            order_id: order.id,
            shipped_by: shipper,
        })
        .await;
    assert!(matches!(
        result,
        Err(FulfillmentError::InvalidTransition { .. })
    ));
    assert_eq!(
        engine.get_order(order.id).await.unwrap().status,
        OrderStatus::Shipped
    );
}

#[tokio::test]
async fn test_gateway_failure_leaves_order_placed_with_no_allocations() {
    let store = MemoryStore::new();
    let warehouse = seed_catalog(&store, &["SKU-001", "SKU-002"]).await;
    let gateway = FlakyGateway::new();
    gateway.decline_sku(&Sku::from("SKU-002"), "no capacity");
    let engine = FulfillmentEngine::new(store, gateway.clone());

    let order = engine
        .create_order(order_cmd(&warehouse, &[("SKU-001", 2), ("SKU-002", 3)]))
        .await
        .unwrap();

    let result = engine
        .fulfill_order(FulfillOrder { order_id: order.id })
        .await;
    assert!(matches!(
        result,
        Err(FulfillmentError::ReservationFailed { .. })
    ));

    // First line was confirmed, second declined; nothing persisted.
    assert_eq!(gateway.request_count(), 2);
    assert_eq!(
        engine.get_order(order.id).await.unwrap().status,
        OrderStatus::Placed
    );
    assert!(engine.allocations(order.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_partial_confirmation_is_recorded_on_the_allocation() {
    let store = MemoryStore::new();
    let warehouse = seed_catalog(&store, &["SKU-001"]).await;
    let gateway = FlakyGateway::new();
    gateway.confirm_partial(&Sku::from("SKU-001"), 3);
    let engine = FulfillmentEngine::new(store, gateway);

    let order = engine
        .create_order(order_cmd(&warehouse, &[("SKU-001", 10)]))
        .await
        .unwrap();
    let (order, allocations) = engine
        .fulfill_order(FulfillOrder { order_id: order.id })
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Reserved);
    assert_eq!(allocations.len(), 1);
    assert_eq!(allocations[0].qty, 3);
}

#[tokio::test]
async fn test_negative_confirmed_qty_aborts_fulfill_and_never_touches_stock() {
    let store = MemoryStore::new();
    let warehouse = seed_catalog(&store, &["SKU-001"]).await;
    let gateway = FlakyGateway::new();
    gateway.confirm_partial(&Sku::from("SKU-001"), -3);
    let engine = FulfillmentEngine::new(store, gateway);
    seed_stock(&engine, &warehouse, "SKU-001", 10).await;

    let order = engine
        .create_order(order_cmd(&warehouse, &[("SKU-001", 5)]))
        .await
        .unwrap();

    let result = engine
        .fulfill_order(FulfillOrder { order_id: order.id })
        .await;
    assert!(matches!(
        result,
        Err(FulfillmentError::ReservationFailed { .. })
    ));

    // A malformed confirmation must never reach the stock path: no
    // allocation, no transition, and the level stays exactly where the
    // receipt left it.
    assert_eq!(
        engine.get_order(order.id).await.unwrap().status,
        OrderStatus::Placed
    );
    assert!(engine.allocations(order.id).await.unwrap().is_empty());
    let stock = engine.stock(&Sku::from("SKU-001")).await.unwrap().unwrap();
    assert_eq!(stock.total_qty, 10);
}

#[tokio::test]
async fn test_zero_confirmed_qty_aborts_fulfill() {
    let store = MemoryStore::new();
    let warehouse = seed_catalog(&store, &["SKU-001"]).await;
    let gateway = FlakyGateway::new();
    gateway.confirm_partial(&Sku::from("SKU-001"), 0);
    let engine = FulfillmentEngine::new(store, gateway);

    let order = engine
        .create_order(order_cmd(&warehouse, &[("SKU-001", 5)]))
        .await
        .unwrap();

    let result = engine
        .fulfill_order(FulfillOrder { order_id: order.id })
        .await;
    assert!(matches!(
        result,
        Err(FulfillmentError::ReservationFailed { .. })
    ));
    assert!(engine.allocations(order.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ship_shortfall_rolls_back_everything() {
    let store = MemoryStore::new();
    let warehouse = seed_catalog(&store, &["SKU-001", "SKU-002"]).await;
    let engine = FulfillmentEngine::new(store, StubGateway::new());
    seed_stock(&engine, &warehouse, "SKU-001", 10).await;
    seed_stock(&engine, &warehouse, "SKU-002", 1).await;

    let order = engine
        .create_order(order_cmd(&warehouse, &[("SKU-001", 4), ("SKU-002", 5)]))
        .await
        .unwrap();
    engine
        .fulfill_order(FulfillOrder { order_id: order.id })
        .await
        .unwrap();
    engine.pick_order(PickOrder { order_id: order.id }).await.unwrap();

    let result = engine
        .ship_order(ShipOrder {
            order_id: order.id,
            shipped_by: UserId::new(),
        })
        .await;
    assert!(matches!(
        result,
        Err(FulfillmentError::InsufficientStock { .. })
    ));

    // SKU-001 had enough and was processed first, but the abort must undo it.
    let sku1 = engine.stock(&Sku::from("SKU-001")).await.unwrap().unwrap();
    let sku2 = engine.stock(&Sku::from("SKU-002")).await.unwrap().unwrap();
    assert_eq!(sku1.total_qty, 10);
    assert_eq!(sku2.total_qty, 1);
    assert_eq!(
        engine.get_order(order.id).await.unwrap().status,
        OrderStatus::Picked
    );
    assert!(
        engine
            .store()
            .ledger_for_reference(order.id.as_uuid())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_ship_decrements_stock_and_writes_one_ledger_row_per_allocation() {
    let store = MemoryStore::new();
    let warehouse = seed_catalog(&store, &["SKU-001", "SKU-002"]).await;
    let engine = FulfillmentEngine::new(store, StubGateway::new());
    seed_stock(&engine, &warehouse, "SKU-001", 10).await;
    seed_stock(&engine, &warehouse, "SKU-002", 8).await;

    let order = engine
        .create_order(order_cmd(&warehouse, &[("SKU-001", 4), ("SKU-002", 2)]))
        .await
        .unwrap();
    engine
        .fulfill_order(FulfillOrder { order_id: order.id })
        .await
        .unwrap();
    engine.pick_order(PickOrder { order_id: order.id }).await.unwrap();
    engine
        .ship_order(ShipOrder {
            order_id: order.id,
            shipped_by: UserId::new(),
        })
        .await
        .unwrap();

    let sku1 = engine.stock(&Sku::from("SKU-001")).await.unwrap().unwrap();
    let sku2 = engine.stock(&Sku::from("SKU-002")).await.unwrap().unwrap();
    assert_eq!(sku1.total_qty, 6);
    assert_eq!(sku2.total_qty, 6);

    let entries = engine
        .store()
        .ledger_for_reference(order.id.as_uuid())
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
    for entry in &entries {
        assert_eq!(entry.operation_type, OperationType::Delivery);
        assert_eq!(entry.reference_id, Some(order.id.as_uuid()));
        assert!(entry.qty_change < 0);
    }
    let total_change: i64 = entries.iter().map(|e| e.qty_change).sum();
    assert_eq!(total_change, -6);
}

#[tokio::test]
async fn test_concurrent_ships_never_oversell() {
    let store = MemoryStore::new();
    let warehouse = seed_catalog(&store, &["SKU-001"]).await;
    let engine = Arc::new(FulfillmentEngine::new(store, StubGateway::new()));
    seed_stock(&engine, &warehouse, "SKU-001", 10).await;

    // Two orders of 6 against 10 on hand; both reach Picked (the stub
    // gateway holds nothing back), then race to ship.
    let mut order_ids = Vec::new();
    for _ in 0..2 {
        let order = engine
            .create_order(order_cmd(&warehouse, &[("SKU-001", 6)]))
            .await
            .unwrap();
        engine
            .fulfill_order(FulfillOrder { order_id: order.id })
            .await
            .unwrap();
        engine.pick_order(PickOrder { order_id: order.id }).await.unwrap();
        order_ids.push(order.id);
    }

    let shipper = UserId::new();
    let ship = |order_id| {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .ship_order(ShipOrder {
                    order_id,
                    shipped_by: shipper,
                })
                .await
        })
    };
    let (a, b) = tokio::join!(ship(order_ids[0]), ship(order_ids[1]));
    let a = a.unwrap();
    let b = b.unwrap();

    let shipped = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(shipped, 1, "only one of the racing ships may succeed");
    for result in [a, b] {
        if let Err(err) = result {
            assert!(matches!(err, FulfillmentError::InsufficientStock { .. }));
        }
    }

    let stock = engine.stock(&Sku::from("SKU-001")).await.unwrap().unwrap();
    assert_eq!(stock.total_qty, 4);
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let store = MemoryStore::new();
    let warehouse = seed_catalog(&store, &["SKU-001"]).await;
    let engine = FulfillmentEngine::new(store, StubGateway::new());
    seed_stock(&engine, &warehouse, "SKU-001", 10).await;

    let order = engine
        .create_order(order_cmd(&warehouse, &[("SKU-001", 5)]))
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Placed);

    let (order, allocations) = engine
        .fulfill_order(FulfillOrder { order_id: order.id })
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Reserved);
    assert_eq!(allocations.len(), 1);
    assert_eq!(allocations[0].qty, 5);

    let order = engine
        .pick_order(PickOrder { order_id: order.id })
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Picked);

    let order = engine
        .ship_order(ShipOrder {
            order_id: order.id,
            shipped_by: UserId::new(),
        })
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Shipped);

    let stock = engine.stock(&Sku::from("SKU-001")).await.unwrap().unwrap();
    assert_eq!(stock.total_qty, 5);

    let entries = engine
        .store()
        .ledger_for_reference(order.id.as_uuid())
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].qty_change, -5);

    // The movement trail shows the receipt and the shipment.
    let movements = engine
        .stock_transactions(&Sku::from("SKU-001"))
        .await
        .unwrap();
    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0].delta, 10);
    assert_eq!(movements[1].delta, -5);
}
