use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use super::{conflict_rules, handlers, middleware, searchees};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/api/v1/conflict-rules", get(conflict_rules::get_rules))
        .route("/api/v1/conflict-rules", put(conflict_rules::save_rules))
        .route(
            "/api/v1/conflict-rules/tracker-options",
            get(conflict_rules::tracker_options),
        )
        .route("/api/v1/searchees/candidates", get(searchees::candidates))
        .route("/api/v1/searchees/collisions", get(searchees::collisions))
        .route(
            "/api/v1/searchees/collision-filters",
            get(searchees::collision_filters),
        )
        .route("/api/v1/searchees/bulk-search", post(searchees::bulk_search))
        .route_layer(from_fn_with_state(state.clone(), middleware::auth_middleware));

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .merge(api)
        .layer(axum::middleware::from_fn(middleware::metrics_middleware))
        .with_state(state)
}
