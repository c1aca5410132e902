//! Stock level, movement history, and receiving endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Sku, UserId, WarehouseId};
use fulfillment::{ReceiveStock, ReservationGateway};
use serde::{Deserialize, Serialize};
use store::FulfillmentStore;
use uuid::Uuid;

use super::orders::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ReceiveStockRequest {
    pub warehouse_id: Uuid,
    pub qty: i64,
    pub reason: Option<String>,
    pub received_by: Option<Uuid>,
}

#[derive(Serialize)]
pub struct StockResponse {
    pub sku: String,
    pub total_qty: i64,
    pub reserved_qty: i64,
    pub available: i64,
}

#[derive(Serialize)]
pub struct StockTransactionResponse {
    pub sku: String,
    pub delta: i64,
    pub reason: String,
}

/// GET /stock/:sku — current stock level for a SKU.
#[tracing::instrument(skip(state))]
pub async fn get_stock<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(sku): Path<String>,
) -> Result<Json<StockResponse>, ApiError>
where
    S: FulfillmentStore,
    G: ReservationGateway,
{
    let sku = Sku::from(sku);
    let stock = state
        .engine
        .stock(&sku)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no stock entry for SKU {sku}")))?;

    Ok(Json(StockResponse {
        sku: stock.sku.to_string(),
        available: stock.available(),
        total_qty: stock.total_qty,
        reserved_qty: stock.reserved_qty,
    }))
}

/// GET /stock/:sku/transactions — movement history for a SKU, oldest first.
#[tracing::instrument(skip(state))]
pub async fn transactions<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(sku): Path<String>,
) -> Result<Json<Vec<StockTransactionResponse>>, ApiError>
where
    S: FulfillmentStore,
    G: ReservationGateway,
{
    let sku = Sku::from(sku);
    let movements = state.engine.stock_transactions(&sku).await?;
    Ok(Json(
        movements
            .into_iter()
            .map(|txn| StockTransactionResponse {
                sku: txn.sku.to_string(),
                delta: txn.delta,
                reason: txn.reason,
            })
            .collect(),
    ))
}

/// POST /stock/:sku/receive — receive stock through the ledger-backed path.
#[tracing::instrument(skip(state, req))]
pub async fn receive<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Path(sku): Path<String>,
    Json(req): Json<ReceiveStockRequest>,
) -> Result<(StatusCode, Json<StockTransactionResponse>), ApiError>
where
    S: FulfillmentStore,
    G: ReservationGateway,
{
    let txn = state
        .engine
        .receive_stock(ReceiveStock {
            sku: Sku::from(sku),
            warehouse_id: WarehouseId::from_uuid(req.warehouse_id),
            qty: req.qty,
            reason: req.reason,
            received_by: req.received_by.map(UserId::from_uuid).unwrap_or_default(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(StockTransactionResponse {
            sku: txn.sku.to_string(),
            delta: txn.delta,
            reason: txn.reason,
        }),
    ))
}
