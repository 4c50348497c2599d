use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use admin_cell::router::admin_routes;
use appointment_cell::router::{appointment_routes, provider_routes};
use reminder_cell::router::reminder_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "MedGate API is running!" }))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/provider/appointments", provider_routes(state.clone()))
        .nest("/cron", reminder_routes(state.clone()))
        .nest("/admin", admin_routes(state))
}
