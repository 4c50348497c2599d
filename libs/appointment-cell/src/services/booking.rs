// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, AppointmentError, AppointmentFilter, AppointmentPatch, AppointmentStatus,
    CreateAppointmentRequest, NewAppointment, PatientActor, ProviderActor,
    SuggestAlternativeRequest, CANCELLABLE_STATUSES, DEFAULT_SUGGESTION_REASON,
    SUGGESTION_REJECTED_REASON,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::reference::{generate_reference_number, reference_date, MAX_REFERENCE_ATTEMPTS};
use crate::services::refresh::ViewRefreshNotifier;
use crate::services::store::AppointmentStore;

/// Patient and provider actions over the appointment state machine.
///
/// Every mutation is a single filtered update whose filter encodes the
/// ownership and status precondition, so a concurrent change that lands
/// first makes the update match zero rows and the action fails with
/// `NotFound` instead of overwriting it.
pub struct AppointmentBookingService {
    store: AppointmentStore,
    lifecycle_service: AppointmentLifecycleService,
    refresher: ViewRefreshNotifier,
    clinic_offset: FixedOffset,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(config, Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(config: &AppConfig, supabase: Arc<SupabaseClient>) -> Self {
        let clinic_offset = FixedOffset::east_opt(config.clinic_utc_offset_minutes * 60)
            .unwrap_or_else(|| {
                warn!(
                    "Invalid clinic UTC offset of {} minutes, dating references in UTC",
                    config.clinic_utc_offset_minutes
                );
                Utc.fix()
            });

        Self {
            store: AppointmentStore::new(supabase),
            lifecycle_service: AppointmentLifecycleService::new(),
            refresher: ViewRefreshNotifier::new(config),
            clinic_offset,
        }
    }

    // ==========================================================================
    // PATIENT ACTIONS
    // ==========================================================================

    pub async fn create_appointment(
        &self,
        actor: &PatientActor,
        request: CreateAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let hospital_id = parse_id("hospital_id", &request.hospital_id)?;
        let department_id = parse_id("department_id", &request.department_id)?;
        let appointment_date = parse_date("appointment_date", &request.appointment_date)?;
        let start_time = parse_time("start_time", &request.start_time)?;

        info!("Creating appointment for patient {} at hospital {}", actor.patient_id, hospital_id);

        let now = Utc::now();
        let created_on = reference_date(now, &self.clinic_offset);
        let reference_number = self.unique_reference_number(created_on, auth_token).await?;

        let appointment = self.store.insert(&NewAppointment {
            reference_number,
            patient_id: actor.patient_id,
            hospital_id,
            department_id,
            appointment_date,
            start_time,
            status: AppointmentStatus::Pending,
            reason: non_empty(request.reason),
            created_at: now,
        }, auth_token).await?;

        info!("Appointment {} created with reference {}", appointment.id, appointment.reference_number);
        self.refresher.refresh_appointment_views().await;
        Ok(appointment)
    }

    pub async fn cancel_appointment(
        &self,
        actor: &PatientActor,
        appointment_id: Uuid,
        reason: Option<String>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Patient {} cancelling appointment {}", actor.patient_id, appointment_id);

        let now = Utc::now();
        let filter = AppointmentFilter::by_id(appointment_id)
            .owned_by(actor.patient_id)
            .with_statuses(&CANCELLABLE_STATUSES);
        let patch = AppointmentPatch {
            status: Some(AppointmentStatus::Cancelled),
            rejection_reason: non_empty(reason),
            cancelled_at: Some(now),
            updated_at: Some(now),
            ..AppointmentPatch::default()
        };

        let appointment = self.apply_single(&filter, &patch, auth_token).await?;

        info!("Appointment {} cancelled by patient {}", appointment_id, actor.patient_id);
        self.refresher.refresh_appointment_views().await;
        Ok(appointment)
    }

    pub async fn respond_to_suggestion(
        &self,
        actor: &PatientActor,
        appointment_id: Uuid,
        accept: bool,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let filter = AppointmentFilter::by_id(appointment_id)
            .owned_by(actor.patient_id)
            .with_statuses(&[AppointmentStatus::Suggested]);

        let current = self.store.find_one(&filter, auth_token).await?
            .ok_or(AppointmentError::NotFound)?;

        let now = Utc::now();
        let patch = if accept {
            AppointmentPatch {
                status: Some(AppointmentStatus::Confirmed),
                appointment_date: current.suggested_date,
                start_time: current.suggested_time,
                suggested_date: Some(None),
                suggested_time: Some(None),
                updated_at: Some(now),
                ..AppointmentPatch::default()
            }
        } else {
            AppointmentPatch {
                status: Some(AppointmentStatus::Cancelled),
                rejection_reason: Some(SUGGESTION_REJECTED_REASON.to_string()),
                suggested_date: Some(None),
                suggested_time: Some(None),
                cancelled_at: Some(now),
                updated_at: Some(now),
                ..AppointmentPatch::default()
            }
        };

        if let Some(target) = &patch.status {
            self.lifecycle_service.validate_status_transition(&current.status, target)?;
        }

        let appointment = self.apply_single(&filter, &patch, auth_token).await?;

        info!(
            "Patient {} {} suggestion for appointment {}",
            actor.patient_id,
            if accept { "accepted" } else { "rejected" },
            appointment_id
        );
        self.refresher.refresh_appointment_views().await;
        Ok(appointment)
    }

    pub async fn get_patient_appointment(
        &self,
        actor: &PatientActor,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let filter = AppointmentFilter::by_id(appointment_id).owned_by(actor.patient_id);
        self.store.find_one(&filter, auth_token).await?
            .ok_or(AppointmentError::NotFound)
    }

    pub async fn list_patient_appointments(
        &self,
        actor: &PatientActor,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let filter = AppointmentFilter {
            patient_id: Some(actor.patient_id),
            ..AppointmentFilter::default()
        };
        self.store.find(&filter, auth_token).await
    }

    // ==========================================================================
    // PROVIDER ACTIONS
    // ==========================================================================

    pub async fn approve_appointment(
        &self,
        actor: &ProviderActor,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.review(actor, appointment_id, AppointmentStatus::Confirmed, AppointmentPatch::default(), auth_token)
            .await
    }

    pub async fn reject_appointment(
        &self,
        actor: &ProviderActor,
        appointment_id: Uuid,
        rejection_reason: String,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let rejection_reason = non_empty(Some(rejection_reason)).ok_or_else(|| {
            AppointmentError::ValidationError("rejection_reason is required".to_string())
        })?;

        let patch = AppointmentPatch {
            rejection_reason: Some(rejection_reason),
            ..AppointmentPatch::default()
        };
        self.review(actor, appointment_id, AppointmentStatus::Rejected, patch, auth_token)
            .await
    }

    pub async fn suggest_alternative(
        &self,
        actor: &ProviderActor,
        appointment_id: Uuid,
        request: SuggestAlternativeRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let suggested_date = parse_date("suggested_date", &request.suggested_date)?;
        let suggested_time = parse_time("suggested_time", &request.suggested_time)?;

        let patch = AppointmentPatch {
            suggested_date: Some(Some(suggested_date)),
            suggested_time: Some(Some(suggested_time)),
            rejection_reason: Some(
                non_empty(request.reason).unwrap_or_else(|| DEFAULT_SUGGESTION_REASON.to_string()),
            ),
            ..AppointmentPatch::default()
        };
        self.review(actor, appointment_id, AppointmentStatus::Suggested, patch, auth_token)
            .await
    }

    pub async fn get_hospital_appointment(
        &self,
        actor: &ProviderActor,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.store.find_one(&AppointmentFilter::by_id(appointment_id), auth_token).await?
            .ok_or(AppointmentError::NotFound)?;

        if appointment.hospital_id != actor.hospital_id {
            return Err(AppointmentError::Unauthorized(
                "Appointment belongs to another hospital".to_string(),
            ));
        }
        Ok(appointment)
    }

    pub async fn list_hospital_appointments(
        &self,
        actor: &ProviderActor,
        status: Option<AppointmentStatus>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let filter = AppointmentFilter {
            hospital_id: Some(actor.hospital_id),
            statuses: status.into_iter().collect(),
            ..AppointmentFilter::default()
        };
        self.store.find(&filter, auth_token).await
    }

    // ==========================================================================
    // INTERNALS
    // ==========================================================================

    /// Shared precondition checks and guarded update for approve / reject / suggest.
    async fn review(
        &self,
        actor: &ProviderActor,
        appointment_id: Uuid,
        target: AppointmentStatus,
        mut patch: AppointmentPatch,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get_hospital_appointment(actor, appointment_id, auth_token).await?;

        self.lifecycle_service.ensure_reviewable(&current.status)?;
        self.lifecycle_service.validate_status_transition(&current.status, &target)?;

        let now = Utc::now();
        patch.status = Some(target);
        patch.reviewed_by = Some(actor.provider_id);
        patch.reviewed_at = Some(now);
        patch.updated_at = Some(now);

        let filter = AppointmentFilter::by_id(appointment_id)
            .in_hospital(actor.hospital_id)
            .with_statuses(&[AppointmentStatus::Pending]);

        let appointment = self.apply_single(&filter, &patch, auth_token).await?;

        info!("Provider {} set appointment {} to {}", actor.provider_id, appointment_id, target);
        self.refresher.refresh_appointment_views().await;
        Ok(appointment)
    }

    async fn apply_single(
        &self,
        filter: &AppointmentFilter,
        patch: &AppointmentPatch,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        self.store.update(filter, patch, auth_token).await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                warn!("Update matched no rows for filter {}", filter.to_query());
                AppointmentError::NotFound
            })
    }

    async fn unique_reference_number(
        &self,
        created_on: NaiveDate,
        auth_token: &str,
    ) -> Result<String, AppointmentError> {
        for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
            let candidate = generate_reference_number(created_on, &mut rand::thread_rng());
            if !self.store.reference_exists(&candidate, auth_token).await? {
                return Ok(candidate);
            }
            warn!("Reference {} already taken (attempt {})", candidate, attempt);
        }

        Err(AppointmentError::StoreError(
            "Could not generate a unique reference number".to_string(),
        ))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_id(field: &str, raw: &str) -> Result<Uuid, AppointmentError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppointmentError::ValidationError(format!("{} must be a valid id", field)))
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, AppointmentError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        AppointmentError::ValidationError(format!("{} must be formatted YYYY-MM-DD", field))
    })
}

fn parse_time(field: &str, raw: &str) -> Result<NaiveTime, AppointmentError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| AppointmentError::ValidationError(format!("{} must be formatted HH:MM", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_times() {
        assert_eq!(parse_time("t", "14:00").unwrap(), NaiveTime::from_hms_opt(14, 0, 0).unwrap());
        assert_eq!(parse_time("t", "09:15:30").unwrap(), NaiveTime::from_hms_opt(9, 15, 30).unwrap());
        assert!(parse_time("t", "2pm").is_err());
    }

    #[test]
    fn rejects_malformed_dates_and_ids() {
        assert!(parse_date("d", "10/03/2026").is_err());
        assert!(parse_id("hospital_id", "not-a-uuid").is_err());
    }

    #[test]
    fn blank_reasons_are_dropped() {
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(Some(" late ".to_string())), Some("late".to_string()));
    }
}
