// libs/membership-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn membership_routes(state: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/", post(handlers::purchase_membership))
        .route("/current", get(handlers::get_current_membership))
        .route("/{membership_id}/cancel", post(handlers::cancel_membership))
        // Staff dashboards
        .route("/admin/all", get(handlers::list_memberships))
        .route("/admin/{membership_id}/approve", post(handlers::approve_membership))
        .route("/admin/{membership_id}/reject", post(handlers::reject_membership))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
