// libs/admin-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};
use tracing::warn;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{OnboardHospitalRequest, OnboardingError};
use crate::services::HospitalOnboardingService;

impl From<OnboardingError> for AppError {
    fn from(e: OnboardingError) -> Self {
        match e {
            OnboardingError::Unauthorized => AppError::Forbidden(e.to_string()),
            OnboardingError::ValidationError(msg) => AppError::ValidationError(msg),
            OnboardingError::StepFailed { .. } => AppError::ExternalService(e.to_string()),
            OnboardingError::NotConfigured(_) => AppError::Internal(e.to_string()),
        }
    }
}

#[axum::debug_handler]
pub async fn onboard_hospital(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<OnboardHospitalRequest>,
) -> Result<Json<Value>, AppError> {
    if !user.is_admin() {
        warn!("User {} attempted hospital onboarding without admin role", user.id);
        return Err(OnboardingError::Unauthorized.into());
    }

    let service = HospitalOnboardingService::new(&state)?;
    let hospital = service.onboard(request).await?;

    Ok(Json(json!({
        "success": true,
        "hospital": hospital,
        "message": "Hospital onboarded"
    })))
}
