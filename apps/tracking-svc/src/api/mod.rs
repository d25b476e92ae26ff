//! HTTP routes.

pub mod health;
pub mod metrics;
pub mod tracking;

use axum::Router;

use crate::state::AppState;

/// Versioned API routes, nested under /api by `axum_helpers::create_router`
pub fn routes(state: &AppState) -> Router {
    Router::new().nest("/v1", tracking::router(state))
}

/// Readiness and metrics, served at the root next to /health
pub fn operational_routes(state: &AppState) -> Router {
    Router::new()
        .merge(health::router(state.clone()))
        .merge(metrics::router(state.metrics.clone()))
}
