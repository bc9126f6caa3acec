use crate::config::ServerConfig;
use crate::error::AppError;
use crate::handlers::{self, category, product};
use crate::health;
use crate::logging::request_span;
use crate::metrics::{METRICS, RequestTimer};
use crate::model::STORE_PREFIX;
use crate::shutdown::{CompositeShutdownHandler, ShutdownCoordinator, StoreShutdownHandler};
use crate::state::AppState;
use anyhow::{Context, Result};
use axum::extract::{MatchedPath, Request};
use axum::http::header;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::Instrument;

const METRICS_CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Catalog routes, mounted under [`STORE_PREFIX`].
fn store_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::home))
        .route("/categories", get(category::list))
        .route(
            "/category/create",
            get(category::create_form).post(category::create),
        )
        .route("/category/{id}", get(category::detail))
        .route(
            "/category/{id}/update",
            get(category::update_form).post(category::update),
        )
        .route(
            "/category/{id}/delete",
            get(category::delete_form).post(category::delete),
        )
        .route("/products", get(product::list))
        .route(
            "/product/create",
            get(product::create_form).post(product::create),
        )
        .route("/product/{id}", get(product::detail))
        .route(
            "/product/{id}/update",
            get(product::update_form).post(product::update),
        )
        .route(
            "/product/{id}/delete",
            get(product::delete_form).post(product::delete),
        )
}

/// The complete application: catalog pages, health probes and metrics.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .nest(STORE_PREFIX, store_routes())
        .route("/health", get(health::liveness_handler))
        .route("/ready", get(health::readiness_handler))
        .route("/metrics", get(metrics_handler))
        .fallback(not_found)
        .layer(middleware::from_fn(track_requests))
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound("Page")
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)], METRICS.encode())
}

/// Logs and times each request under its matched route.
async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let span = request_span(&method, &path);
    span.record("http.route", route.as_str());

    let timer = RequestTimer::start();
    let response = next.run(request).instrument(span.clone()).await;
    let status = response.status().as_u16();
    let latency = timer.finish(&method, &route, status);

    span.record("http.status", status);
    span.in_scope(|| {
        tracing::info!(
            method = %method,
            route = %route,
            status,
            latency_ms = latency.as_secs_f64() * 1000.0,
            "request completed"
        );
    });
    response
}

/// Serves `state` on `listener` until `coordinator` signals shutdown, then
/// closes the store.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    coordinator: Arc<ShutdownCoordinator>,
) -> Result<()> {
    let mut handlers = CompositeShutdownHandler::new();
    handlers.add_handler(Box::new(StoreShutdownHandler::new(state.store().clone())));

    let local_addr = listener.local_addr()?;
    tracing::info!(bind = %local_addr, prefix = STORE_PREFIX, "listening");

    let router = build_router(state);
    let signal_coordinator = coordinator.clone();
    let server_result = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            signal_coordinator.shutdown_signal().await;
        })
        .await;

    tracing::info!("server stopped, running shutdown handlers");
    let shutdown_result = coordinator.run_handlers(&handlers).await;

    server_result.context("HTTP server failed")?;
    shutdown_result
}

/// Opens the store, binds the configured address and serves until a signal.
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let config = Arc::new(config);
    let state = Arc::new(AppState::connect(config.clone()).await?);

    tracing::info!(
        bind = %config.bind_address,
        store = %config.store_target,
        "starting corner store server",
    );

    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    let coordinator = Arc::new(ShutdownCoordinator::new(config.shutdown_timeout()));
    serve(listener, state, coordinator).await
}
