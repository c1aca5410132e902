//! Catalog and warehouse seed endpoints.
//!
//! Products and warehouses are collaborators of the fulfillment pipeline,
//! not its subject; these endpoints exist so orders have something to
//! resolve SKUs and destinations against.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::Sku;
use domain::{Product, Warehouse};
use fulfillment::ReservationGateway;
use serde::{Deserialize, Serialize};
use store::FulfillmentStore;

use super::orders::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub sku: String,
    pub name: String,
    pub uom: Option<String>,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub uom: String,
}

#[derive(Deserialize)]
pub struct CreateWarehouseRequest {
    pub name: String,
    pub location: Option<String>,
}

#[derive(Serialize)]
pub struct WarehouseResponse {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
}

/// POST /products — create or update a catalog product by SKU.
#[tracing::instrument(skip(state, req))]
pub async fn create_product<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError>
where
    S: FulfillmentStore,
    G: ReservationGateway,
{
    if req.sku.trim().is_empty() {
        return Err(ApiError::BadRequest("sku must not be empty".to_string()));
    }

    let product = Product::new(
        Sku::from(req.sku),
        req.name,
        req.uom.unwrap_or_else(|| "unit".to_string()),
    );
    state.engine.store().upsert_product(&product).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            id: product.id.to_string(),
            sku: product.sku.to_string(),
            name: product.name,
            uom: product.uom,
        }),
    ))
}

/// POST /warehouses — create a warehouse.
#[tracing::instrument(skip(state, req))]
pub async fn create_warehouse<S, G>(
    State(state): State<Arc<AppState<S, G>>>,
    Json(req): Json<CreateWarehouseRequest>,
) -> Result<(StatusCode, Json<WarehouseResponse>), ApiError>
where
    S: FulfillmentStore,
    G: ReservationGateway,
{
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }

    let warehouse = Warehouse::new(req.name, req.location);
    state.engine.store().upsert_warehouse(&warehouse).await?;

    Ok((
        StatusCode::CREATED,
        Json(WarehouseResponse {
            id: warehouse.id.to_string(),
            name: warehouse.name,
            location: warehouse.location,
        }),
    ))
}
