//! HTTP API server with observability for the kitchen backend.
//!
//! Provides REST endpoints for the menu, stock and orders, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{InventoryService, MenuService, OrderService, ReportService};
use metrics_exporter_prometheus::PrometheusHandle;
use store::KitchenStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: KitchenStore> {
    pub menu: MenuService<S>,
    pub inventory: InventoryService<S>,
    pub orders: OrderService<S>,
    pub reports: ReportService<S>,
}

impl<S: KitchenStore + Clone> AppState<S> {
    /// Builds every service over the same store.
    pub fn new(store: S, order_max_attempts: u32) -> Self {
        Self {
            menu: MenuService::new(store.clone()),
            inventory: InventoryService::new(store.clone()),
            orders: OrderService::new(store.clone()).with_max_attempts(order_max_attempts),
            reports: ReportService::new(store),
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: KitchenStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/menu", get(routes::menu::list::<S>))
        .route("/menu/{id}", get(routes::menu::get::<S>))
        .route(
            "/menu/{id}/availability",
            get(routes::menu::availability::<S>),
        )
        .route("/ingredients", get(routes::stock::ingredients::<S>))
        .route(
            "/ingredients/{id}/stock",
            get(routes::stock::for_ingredient::<S>),
        )
        .route(
            "/ingredients/{id}/stock/deduct",
            post(routes::stock::deduct::<S>),
        )
        .route(
            "/stock",
            get(routes::stock::list::<S>).post(routes::stock::ingest::<S>),
        )
        .route("/stock/{lot_id}", get(routes::stock::get::<S>))
        .route(
            "/orders",
            get(routes::orders::list::<S>).post(routes::orders::place::<S>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/reports/stock", get(routes::reports::stock::<S>))
        .route("/reports/orders", get(routes::reports::orders::<S>))
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
