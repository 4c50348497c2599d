// libs/reminder-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_config::AppConfig;
use shared_utils::extractor::cron_secret_middleware;

use crate::handlers;

/// Scheduler trigger, mounted under `/cron`.
pub fn reminder_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route(
            "/reminders",
            get(handlers::run_reminder_sweep).post(handlers::run_reminder_sweep),
        )
        .layer(middleware::from_fn_with_state(state.clone(), cron_secret_middleware))
        .with_state(state)
}
