//! HTTP API server with observability for the POS backend.
//!
//! Exposes the sale commit/refund operations and the catalog, directory,
//! and reporting reads, with structured logging (tracing) and Prometheus
//! metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod session;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::SaleCoordinator;
use domain::Settings;
use metrics_exporter_prometheus::PrometheusHandle;
use store::PosStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::sales::AppState;
use session::IdentityProvider;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: PosStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/sales",
            post(routes::sales::create::<S>).get(routes::sales::list::<S>),
        )
        .route("/sales/{id}", get(routes::sales::get::<S>))
        .route("/sales/{id}/refund", post(routes::sales::refund::<S>))
        .route("/products", get(routes::catalog::products::<S>))
        .route("/customers", get(routes::catalog::customers::<S>))
        .route("/reports/summary", get(routes::reports::summary::<S>))
        .route("/settings", get(routes::settings::get::<S>))
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

/// Creates the application state over the given storage backend.
pub fn create_default_state<S: PosStore + Clone>(
    store: S,
    settings: Settings,
    sessions: Arc<dyn IdentityProvider>,
) -> Arc<AppState<S>> {
    let coordinator = SaleCoordinator::new(store.clone(), settings);
    Arc::new(AppState {
        coordinator,
        store,
        sessions,
    })
}
