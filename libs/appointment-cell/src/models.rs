// libs/appointment-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc, NaiveDate, NaiveTime};
use std::fmt;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub reference_number: String,
    pub patient_id: Uuid,
    pub hospital_id: Uuid,
    pub department_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub rejection_reason: Option<String>,
    pub suggested_date: Option<NaiveDate>,
    pub suggested_time: Option<NaiveTime>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Rejected,
    Suggested,
    Cancelled,
    /// Set by the front desk after the visit; never produced here.
    Completed,
    /// Legacy rows imported before the review workflow existed.
    Scheduled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Rejected => "rejected",
            AppointmentStatus::Suggested => "suggested",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statuses a patient may cancel from.
pub const CANCELLABLE_STATUSES: [AppointmentStatus; 3] = [
    AppointmentStatus::Pending,
    AppointmentStatus::Confirmed,
    AppointmentStatus::Suggested,
];

pub const SUGGESTION_REJECTED_REASON: &str = "Patient rejected suggested alternative";
pub const DEFAULT_SUGGESTION_REASON: &str = "We have suggested an alternative time slot.";

// ==============================================================================
// ACTORS
// ==============================================================================

/// Patient resolved once at the request boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientActor {
    pub user_id: String,
    pub patient_id: Uuid,
}

/// Hospital staff member resolved once at the request boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderActor {
    pub user_id: String,
    pub provider_id: Uuid,
    pub hospital_id: Uuid,
}

// ==============================================================================
// DATA ACCESS MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct NewAppointment {
    pub reference_number: String,
    pub patient_id: Uuid,
    pub hospital_id: Uuid,
    pub department_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Column updates for a filtered PATCH; unset fields are left untouched.
/// Nullable columns use a nested `Option` where `Some(None)` writes `null`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AppointmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_time: Option<Option<NaiveTime>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Row filter rendered as PostgREST query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppointmentFilter {
    pub id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub hospital_id: Option<Uuid>,
    pub reference_number: Option<String>,
    pub statuses: Vec<AppointmentStatus>,
}

impl AppointmentFilter {
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_reference(reference_number: &str) -> Self {
        Self {
            reference_number: Some(reference_number.to_string()),
            ..Self::default()
        }
    }

    pub fn owned_by(mut self, patient_id: Uuid) -> Self {
        self.patient_id = Some(patient_id);
        self
    }

    pub fn in_hospital(mut self, hospital_id: Uuid) -> Self {
        self.hospital_id = Some(hospital_id);
        self
    }

    pub fn with_statuses(mut self, statuses: &[AppointmentStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn to_query(&self) -> String {
        let mut query_parts = Vec::new();

        if let Some(id) = self.id {
            query_parts.push(format!("id=eq.{}", id));
        }
        if let Some(patient_id) = self.patient_id {
            query_parts.push(format!("patient_id=eq.{}", patient_id));
        }
        if let Some(hospital_id) = self.hospital_id {
            query_parts.push(format!("hospital_id=eq.{}", hospital_id));
        }
        if let Some(reference_number) = &self.reference_number {
            query_parts.push(format!("reference_number=eq.{}", reference_number));
        }
        match self.statuses.as_slice() {
            [] => {}
            [status] => query_parts.push(format!("status=eq.{}", status)),
            statuses => {
                let list: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
                query_parts.push(format!("status=in.({})", list.join(",")));
            }
        }

        query_parts.join("&")
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub hospital_id: String,
    pub department_id: String,
    pub appointment_date: String,
    pub start_time: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondToSuggestionRequest {
    pub accept: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectAppointmentRequest {
    pub rejection_reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestAlternativeRequest {
    pub suggested_date: String,
    pub suggested_time: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HospitalAppointmentsQuery {
    pub status: Option<AppointmentStatus>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error, PartialEq)]
pub enum AppointmentError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Appointment not found or cannot be modified")]
    NotFound,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidState(AppointmentStatus),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Patient profile not found")]
    PatientProfileMissing,

    #[error("Database error: {0}")]
    StoreError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_renders_postgrest_query() {
        let id = Uuid::nil();
        let query = AppointmentFilter::by_id(id)
            .owned_by(id)
            .with_statuses(&CANCELLABLE_STATUSES)
            .to_query();

        assert_eq!(
            query,
            format!("id=eq.{id}&patient_id=eq.{id}&status=in.(pending,confirmed,suggested)")
        );

        let single = AppointmentFilter::by_id(id).with_statuses(&[AppointmentStatus::Pending]);
        assert!(single.to_query().ends_with("status=eq.pending"));
    }

    #[test]
    fn patch_serializes_only_set_columns() {
        let patch = AppointmentPatch {
            status: Some(AppointmentStatus::Confirmed),
            start_time: NaiveTime::from_hms_opt(9, 30, 0),
            ..AppointmentPatch::default()
        };

        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({ "status": "confirmed", "start_time": "09:30:00" })
        );
    }

    #[test]
    fn patch_writes_null_for_cleared_suggestion() {
        let patch = AppointmentPatch {
            suggested_date: Some(None),
            suggested_time: Some(None),
            ..AppointmentPatch::default()
        };

        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({ "suggested_date": null, "suggested_time": null })
        );
    }
}
