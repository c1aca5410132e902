//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use fulfillment::ReservationGateway;
use serde::Serialize;
use store::FulfillmentStore;

use super::orders::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    /// Active store backend, `"memory"` or `"postgres"`.
    pub store: &'static str,
    /// Active reservation gateway, `"stub"` or `"http"`.
    pub gateway: &'static str,
}

/// GET /health — reports liveness and which backends are wired in.
pub async fn check<S, G>(State(state): State<Arc<AppState<S, G>>>) -> Json<HealthResponse>
where
    S: FulfillmentStore,
    G: ReservationGateway,
{
    Json(HealthResponse {
        status: "ok",
        service: "fulfillment-api",
        store: state.store_kind,
        gateway: state.gateway_kind,
    })
}
