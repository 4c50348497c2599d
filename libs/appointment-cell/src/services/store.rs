// libs/appointment-cell/src/services/store.rs
use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, error};

use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, AppointmentError, AppointmentFilter, AppointmentPatch, NewAppointment,
};

/// Typed access to the `appointments` table.
pub struct AppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl AppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn find(
        &self,
        filter: &AppointmentFilter,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?{}&order=appointment_date.asc,start_time.asc",
            filter.to_query()
        );
        debug!("Fetching appointments: {}", path);

        let rows: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::StoreError(e.to_string()))?;

        parse_rows(rows)
    }

    pub async fn find_one(
        &self,
        filter: &AppointmentFilter,
        auth_token: &str,
    ) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self.find(filter, auth_token).await?.into_iter().next())
    }

    pub async fn reference_exists(
        &self,
        reference_number: &str,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?{}&select=id&limit=1",
            AppointmentFilter::by_reference(reference_number).to_query()
        );

        let rows: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::StoreError(e.to_string()))?;

        Ok(!rows.is_empty())
    }

    pub async fn insert(
        &self,
        appointment: &NewAppointment,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let body = serde_json::to_value(appointment)
            .map_err(|e| AppointmentError::StoreError(e.to_string()))?;

        let rows: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(body),
            Some(SupabaseClient::representation_headers()),
        ).await.map_err(|e| AppointmentError::StoreError(e.to_string()))?;

        parse_rows(rows)?.into_iter().next().ok_or_else(|| {
            error!("Insert returned no row for {}", appointment.reference_number);
            AppointmentError::StoreError("Failed to create appointment".to_string())
        })
    }

    /// Apply `patch` to every row matching `filter`. An empty result means the
    /// filter matched nothing, so callers must treat it as a failed update.
    pub async fn update(
        &self,
        filter: &AppointmentFilter,
        patch: &AppointmentPatch,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!("/rest/v1/appointments?{}", filter.to_query());
        let body = serde_json::to_value(patch)
            .map_err(|e| AppointmentError::StoreError(e.to_string()))?;

        let rows: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(body),
            Some(SupabaseClient::representation_headers()),
        ).await.map_err(|e| AppointmentError::StoreError(e.to_string()))?;

        debug!("Update on {} affected {} rows", path, rows.len());
        parse_rows(rows)
    }
}

fn parse_rows(rows: Vec<Value>) -> Result<Vec<Appointment>, AppointmentError> {
    rows.into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<Appointment>, _>>()
        .map_err(|e| AppointmentError::StoreError(format!("Failed to parse appointments: {}", e)))
}
