//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use api::routes::orders::AppState;
use fulfillment::{FulfillmentEngine, HttpGateway, ReservationGateway, StubGateway};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{FulfillmentStore, MemoryStore, PostgresStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Builds the app for the given store and gateway and serves it until shutdown.
async fn serve<S, G>(
    store: S,
    gateway: G,
    kinds: (&'static str, &'static str),
    config: &Config,
    metrics_handle: PrometheusHandle,
) where
    S: FulfillmentStore + 'static,
    G: ReservationGateway + 'static,
{
    let (store_kind, gateway_kind) = kinds;
    let engine = FulfillmentEngine::new(store, gateway);
    let state = Arc::new(AppState {
        engine,
        store_kind,
        gateway_kind,
    });
    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

/// Dispatches on the configured gateway for an already-chosen store.
async fn serve_with_store<S>(
    store: S,
    store_kind: &'static str,
    config: &Config,
    metrics_handle: PrometheusHandle,
) where
    S: FulfillmentStore + 'static,
{
    match &config.reservation_endpoint {
        Some(endpoint) => {
            tracing::info!(%endpoint, "using HTTP reservation gateway");
            let gateway = HttpGateway::new(endpoint.clone(), config.reservation_timeout())
                .expect("failed to build reservation gateway client");
            serve(store, gateway, (store_kind, "http"), config, metrics_handle).await;
        }
        None => {
            tracing::warn!("no RESERVATION_ENDPOINT set, using stub gateway");
            serve(
                store,
                StubGateway::new(),
                (store_kind, "stub"),
                config,
                metrics_handle,
            )
            .await;
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Pick the store, then serve
    match &config.database_url {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("failed to connect to database");
            let store = PostgresStore::new(pool);
            store.run_migrations().await.expect("migrations failed");
            tracing::info!("using PostgreSQL store");
            serve_with_store(store, "postgres", &config, metrics_handle).await;
        }
        None => {
            tracing::warn!("no DATABASE_URL set, using in-memory store");
            serve_with_store(MemoryStore::new(), "memory", &config, metrics_handle).await;
        }
    }
}
