//! HTTP API server for the order fulfillment system.
//!
//! REST endpoints for placing orders, driving them through the fulfillment
//! pipeline, and inspecting stock, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use fulfillment::ReservationGateway;
use metrics_exporter_prometheus::PrometheusHandle;
use store::FulfillmentStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, G>(state: Arc<AppState<S, G>>, metrics_handle: PrometheusHandle) -> Router
where
    S: FulfillmentStore + 'static,
    G: ReservationGateway + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S, G>))
        .route("/orders", post(routes::orders::create::<S, G>))
        .route("/orders/{id}", get(routes::orders::get::<S, G>))
        .route(
            "/orders/{id}/allocations",
            get(routes::orders::allocations::<S, G>),
        )
        .route(
            "/orders/{id}/fulfill",
            post(routes::orders::fulfill::<S, G>),
        )
        .route("/orders/{id}/pick", post(routes::orders::pick::<S, G>))
        .route("/orders/{id}/ship", post(routes::orders::ship::<S, G>))
        .route("/stock/{sku}", get(routes::stock::get_stock::<S, G>))
        .route(
            "/stock/{sku}/transactions",
            get(routes::stock::transactions::<S, G>),
        )
        .route("/stock/{sku}/receive", post(routes::stock::receive::<S, G>))
        .route("/products", post(routes::catalog::create_product::<S, G>))
        .route(
            "/warehouses",
            post(routes::catalog::create_warehouse::<S, G>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
