use axum::Router;

use crate::state::AppState;

pub fn router(state: &AppState) -> Router {
    domain_tracking::handlers::router(state.tracking.clone())
}
