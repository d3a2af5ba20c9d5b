//! HTTP API server for the order management backend.
//!
//! Exposes the catalog, customer accounts, orders, contact messages and the
//! operational report over REST, with structured logging (tracing) and
//! Prometheus metrics.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use notifications::Notifier;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    use routes::{contact, customers, orders, products, reports, system};

    let metrics_router = Router::new()
        .route("/metrics", get(system::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(system::health))
        .route(
            "/products",
            get(products::list::<S>).post(products::create::<S>),
        )
        .route(
            "/products/{id}",
            get(products::get::<S>)
                .patch(products::update::<S>)
                .delete(products::delete::<S>),
        )
        .route(
            "/customers",
            get(customers::list::<S>).post(customers::create::<S>),
        )
        .route(
            "/customers/{id}",
            get(customers::get::<S>)
                .patch(customers::update::<S>)
                .delete(customers::delete::<S>),
        )
        .route("/customers/{id}/role", put(customers::set_role::<S>))
        .route("/orders", get(orders::list::<S>).post(orders::create::<S>))
        .route(
            "/orders/{id}",
            get(orders::get::<S>)
                .patch(orders::update::<S>)
                .delete(orders::delete::<S>),
        )
        .route("/orders/{id}/set_status", post(orders::set_status::<S>))
        .route("/contact", get(contact::list::<S>).post(contact::create::<S>))
        .route(
            "/contact/{id}",
            get(contact::get::<S>).delete(contact::delete::<S>),
        )
        .route("/reports/overview", get(reports::overview::<S>))
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

/// Creates the application state over `store`.
pub fn create_default_state<S: Store + Clone + 'static>(
    store: S,
    notifier: Notifier,
) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store, notifier))
}
