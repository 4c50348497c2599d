// libs/reminder-cell/src/services/store.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{NewNotificationRecord, ReminderCandidate, ReminderError, ReminderType};

const CANDIDATE_SELECT: &str = "id,reference_number,appointment_date,start_time,\
patients(full_name,phone,email),hospitals(name),departments(name)";

/// Statuses that still expect the patient to show up.
const REMINDABLE_STATUSES: &str = "confirmed,scheduled";

#[derive(Deserialize)]
struct SentRow {
    appointment_id: Uuid,
}

/// Service-role access to appointments and the `notifications` log.
pub struct NotificationStore {
    supabase: Arc<SupabaseClient>,
}

impl NotificationStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Remindable appointments whose date falls in `from..=to`. Callers still
    /// filter on the exact start instant.
    pub async fn appointments_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ReminderCandidate>, ReminderError> {
        let path = format!(
            "/rest/v1/appointments?select={}&status=in.({})&appointment_date=gte.{}&appointment_date=lte.{}&order=appointment_date.asc,start_time.asc",
            CANDIDATE_SELECT, REMINDABLE_STATUSES, from, to
        );
        debug!("Fetching reminder candidates: {}", path);

        let rows: Vec<Value> = self.supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| ReminderError::StoreError(e.to_string()))?;

        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ReminderCandidate>, _>>()
            .map_err(|e| ReminderError::StoreError(format!("Failed to parse appointments: {}", e)))
    }

    /// Appointment ids among `appointment_ids` that already have a successful
    /// SMS recorded for `reminder_type`.
    pub async fn sent_sms_for(
        &self,
        reminder_type: ReminderType,
        appointment_ids: &[Uuid],
    ) -> Result<HashSet<Uuid>, ReminderError> {
        if appointment_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids = appointment_ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let path = format!(
            "/rest/v1/notifications?select=appointment_id&channel=eq.sms&status=eq.sent&reminder_type=eq.{}&appointment_id=in.({})",
            reminder_type, ids
        );

        let rows: Vec<SentRow> = self.supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| ReminderError::StoreError(e.to_string()))?;

        Ok(rows.into_iter().map(|row| row.appointment_id).collect())
    }

    pub async fn record(&self, record: &NewNotificationRecord) -> Result<(), ReminderError> {
        let body = serde_json::to_value(record)
            .map_err(|e| ReminderError::StoreError(e.to_string()))?;

        self.supabase
            .execute(Method::POST, "/rest/v1/notifications", None, Some(body))
            .await
            .map_err(|e| ReminderError::StoreError(e.to_string()))
    }
}
