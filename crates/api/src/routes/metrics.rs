//! Prometheus exposition endpoint.

use axum::extract::State;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use metrics_exporter_prometheus::PrometheusHandle;

/// Content type of the Prometheus text exposition format.
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// GET /metrics — renders the current metrics snapshot for scraping.
///
/// Counters and histograms are recorded by the fulfillment engine
/// (`orders_created_total`, `order_transitions_total`,
/// `fulfillment_failures_total`, `ship_duration_seconds`); this handler
/// only renders whatever the installed recorder has accumulated.
pub async fn get(State(handle): State<PrometheusHandle>) -> Response {
    let mut response = handle.render().into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE),
    );
    response
}
