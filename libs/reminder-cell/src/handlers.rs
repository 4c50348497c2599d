// libs/reminder-cell/src/handlers.rs
use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::error;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::ReminderError;
use crate::services::ReminderScheduler;

impl From<ReminderError> for AppError {
    fn from(e: ReminderError) -> Self {
        match e {
            ReminderError::NotConfigured(_) => AppError::Internal(e.to_string()),
            ReminderError::StoreError(msg) => AppError::Database(msg),
            ReminderError::GatewayError(msg) => AppError::ExternalService(msg),
        }
    }
}

#[axum::debug_handler]
pub async fn run_reminder_sweep(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let scheduler = ReminderScheduler::new(&state).map_err(|e| {
        error!("Cannot start reminder sweep: {}", e);
        e
    })?;

    let summary = scheduler.run_sweep().await;

    Ok(Json(json!({
        "success": true,
        "results": summary
    })))
}
