// libs/admin-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::post, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Administrator routes, mounted under `/admin`.
pub fn admin_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/hospitals", post(handlers::onboard_hospital))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
