//! Order placement and fulfillment pipeline endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderId, Sku, UserId, WarehouseId};
use domain::{Allocation, Order};
use fulfillment::{
    CreateOrder, FulfillOrder, FulfillmentEngine, OrderLine, PickOrder, ReservationGateway,
    ShipOrder,
};
use serde::{Deserialize, Serialize};
use store::FulfillmentStore;
use uuid::Uuid;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: FulfillmentStore, G> {
    pub engine: FulfillmentEngine<S, G>,
    /// Name of the active store backend, reported by `/health`.
    pub store_kind: &'static str,
    /// Name of the active reservation gateway, reported by `/health`.
    pub gateway_kind: &'static str,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub warehouse_id: Uuid,
    pub items: Vec<OrderLineRequest>,
    pub created_by: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct OrderLineRequest {
    pub sku: String,
    pub qty: i64,
}

#[derive(Deserialize, Default)]
pub struct ShipRequest {
    pub shipped_by: Option<Uuid>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub customer_name: String,
    pub warehouse_id: String,
    pub status: String,
    pub items: Vec<OrderItemResponse>,
    pub total_qty: i64,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub sku: String,
    pub qty: i64,
}

#[derive(Serialize)]
pub struct AllocationResponse {
    pub sku: String,
    pub qty: i64,
    pub product_id: String,
    pub warehouse_id: String,
}

#[derive(Serialize)]
pub struct FulfillResponse {
    pub status: String,
    pub allocations: Vec<AllocationResponse>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let total_qty = order.total_qty();
        Self {
            id: order.id.to_string(),
            customer_name: order.customer_name,
            warehouse_id: order.warehouse_id.to_string(),
            status: order.status.to_string(),
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemResponse {
                    sku: item.sku.to_string(),
                    qty: item.qty,
                })
                .collect(),
            total_qty,
        }
    }
}

impl From<Allocation> for AllocationResponse {
    fn from(allocation: Allocation) -> Self {
        Self {
            sku: allocation.sku.to_string(),
            qty: allocation.qty,
            product_id: allocation.product_id.to_string(),
            warehouse_id: allocation.warehouse_id.to_string(),
        }
    }
}

// -- Handlers --

/// POST /orders — place a new order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError>
where
    S: FulfillmentStore,
    G: ReservationGateway,
{
    let cmd = CreateOrder {
        customer_name: req.customer_name,
        warehouse_id: WarehouseId::from_uuid(req.warehouse_id),
        items: req
            .items
            .into_iter()
            .map(|line| OrderLine {
                sku: Sku::from(line.sku),
                qty: line.qty,
            })
            .collect(),
        created_by: req.created_by.map(UserId::from_uuid).unwrap_or_default(),
    };

    let order = state.engine.create_order(cmd).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// GET /orders/:id — load an order by ID.
#[tracing::instrument(skip(state))]
pub async fn get<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: FulfillmentStore,
    G: ReservationGateway,
{
    let order = state.engine.get_order(OrderId::from_uuid(id)).await?;
    Ok(Json(order.into()))
}

/// GET /orders/:id/allocations — list the committed reservations of an order.
#[tracing::instrument(skip(state))]
pub async fn allocations<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AllocationResponse>>, ApiError>
where
    S: FulfillmentStore,
    G: ReservationGateway,
{
    let allocations = state.engine.allocations(OrderId::from_uuid(id)).await?;
    Ok(Json(allocations.into_iter().map(Into::into).collect()))
}

/// POST /orders/:id/fulfill — reserve every line and move to Reserved.
#[tracing::instrument(skip(state))]
pub async fn fulfill<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<FulfillResponse>, ApiError>
where
    S: FulfillmentStore,
    G: ReservationGateway,
{
    let (order, allocations) = state
        .engine
        .fulfill_order(FulfillOrder {
            order_id: OrderId::from_uuid(id),
        })
        .await?;

    Ok(Json(FulfillResponse {
        status: order.status.to_string(),
        allocations: allocations.into_iter().map(Into::into).collect(),
    }))
}

/// POST /orders/:id/pick — move a Reserved order to Picked.
#[tracing::instrument(skip(state))]
pub async fn pick<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: FulfillmentStore,
    G: ReservationGateway,
{
    let order = state
        .engine
        .pick_order(PickOrder {
            order_id: OrderId::from_uuid(id),
        })
        .await?;
    Ok(Json(order.into()))
}

/// POST /orders/:id/ship — decrement stock, write the ledger, move to Shipped.
#[tracing::instrument(skip(state, req))]
pub async fn ship<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(id): Path<Uuid>,
    req: Option<Json<ShipRequest>>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: FulfillmentStore,
    G: ReservationGateway,
{
    let shipped_by = req
        .and_then(|Json(r)| r.shipped_by)
        .map(UserId::from_uuid)
        .unwrap_or_default();

    let order = state
        .engine
        .ship_order(ShipOrder {
            order_id: OrderId::from_uuid(id),
            shipped_by,
        })
        .await?;
    Ok(Json(order.into()))
}
