// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, CancelAppointmentRequest, CreateAppointmentRequest,
    HospitalAppointmentsQuery, PatientActor, ProviderActor, RejectAppointmentRequest,
    RespondToSuggestionRequest, SuggestAlternativeRequest,
};
use crate::services::{AppointmentBookingService, DirectoryService};

impl From<AppointmentError> for AppError {
    fn from(e: AppointmentError) -> Self {
        match e {
            AppointmentError::Unauthenticated => AppError::Auth(e.to_string()),
            AppointmentError::Unauthorized(_) | AppointmentError::PatientProfileMissing => {
                AppError::Forbidden(e.to_string())
            }
            AppointmentError::NotFound => AppError::NotFound(e.to_string()),
            AppointmentError::InvalidState(_) => AppError::Conflict(e.to_string()),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::StoreError(msg) => AppError::Database(msg),
        }
    }
}

struct Services {
    directory: DirectoryService,
    booking: AppointmentBookingService,
}

impl Services {
    fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self {
            directory: DirectoryService::new(Arc::clone(&supabase)),
            booking: AppointmentBookingService::with_client(config, supabase),
        }
    }

    async fn patient(&self, user: &User, token: &str) -> Result<PatientActor, AppError> {
        Ok(self.directory.resolve_patient(user, token).await?)
    }

    async fn provider(&self, user: &User, token: &str) -> Result<ProviderActor, AppError> {
        Ok(self.directory.resolve_provider(user, token).await?)
    }
}

// ==============================================================================
// PATIENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let services = Services::new(&state);
    let actor = services.patient(&user, token).await?;

    let appointment = services.booking.create_appointment(&actor, request, token).await?;

    Ok(Json(json!({
        "success": true,
        "reference_number": appointment.reference_number,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn list_my_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let services = Services::new(&state);
    let actor = services.patient(&user, token).await?;

    let appointments = services.booking.list_patient_appointments(&actor, token).await?;

    Ok(Json(json!({
        "success": true,
        "total": appointments.len(),
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn get_my_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let services = Services::new(&state);
    let actor = services.patient(&user, token).await?;

    let appointment = services.booking.get_patient_appointment(&actor, appointment_id, token).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    request: Option<Json<CancelAppointmentRequest>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let services = Services::new(&state);
    let actor = services.patient(&user, token).await?;
    let reason = request.and_then(|Json(request)| request.reason);

    let appointment = services.booking
        .cancel_appointment(&actor, appointment_id, reason, token)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled successfully"
    })))
}

#[axum::debug_handler]
pub async fn respond_to_suggestion(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RespondToSuggestionRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let services = Services::new(&state);
    let actor = services.patient(&user, token).await?;

    let appointment = services.booking
        .respond_to_suggestion(&actor, appointment_id, request.accept, token)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

// ==============================================================================
// PROVIDER HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_hospital_appointments(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<HospitalAppointmentsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let services = Services::new(&state);
    let actor = services.provider(&user, token).await?;

    let appointments = services.booking
        .list_hospital_appointments(&actor, query.status, token)
        .await?;

    Ok(Json(json!({
        "success": true,
        "total": appointments.len(),
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn get_hospital_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let services = Services::new(&state);
    let actor = services.provider(&user, token).await?;

    let appointment = services.booking.get_hospital_appointment(&actor, appointment_id, token).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn approve_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let services = Services::new(&state);
    let actor = services.provider(&user, token).await?;

    let appointment = services.booking.approve_appointment(&actor, appointment_id, token).await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment approved"
    })))
}

#[axum::debug_handler]
pub async fn reject_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RejectAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let services = Services::new(&state);
    let actor = services.provider(&user, token).await?;

    let appointment = services.booking
        .reject_appointment(&actor, appointment_id, request.rejection_reason, token)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment rejected"
    })))
}

#[axum::debug_handler]
pub async fn suggest_alternative(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<SuggestAlternativeRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let services = Services::new(&state);
    let actor = services.provider(&user, token).await?;

    let appointment = services.booking
        .suggest_alternative(&actor, appointment_id, request, token)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Alternative time suggested"
    })))
}
