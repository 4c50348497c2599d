// libs/appointment-cell/src/services/directory.rs
use std::sync::Arc;

use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{AppointmentError, PatientActor, ProviderActor};

#[derive(Debug, Deserialize)]
struct PatientRow {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct ProviderRow {
    id: Uuid,
    hospital_id: Uuid,
}

/// Maps an authenticated user onto the patient or provider profile they act as.
pub struct DirectoryService {
    supabase: Arc<SupabaseClient>,
}

impl DirectoryService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn resolve_patient(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<PatientActor, AppointmentError> {
        if user.id.is_empty() {
            return Err(AppointmentError::Unauthenticated);
        }

        let path = format!("/rest/v1/patients?user_id=eq.{}&select=id&limit=1", user.id);
        let rows: Vec<PatientRow> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::StoreError(e.to_string()))?;

        let row = rows.into_iter().next().ok_or_else(|| {
            warn!("User {} has no patient profile", user.id);
            AppointmentError::PatientProfileMissing
        })?;

        debug!("Resolved user {} to patient {}", user.id, row.id);
        Ok(PatientActor {
            user_id: user.id.clone(),
            patient_id: row.id,
        })
    }

    pub async fn resolve_provider(
        &self,
        user: &User,
        auth_token: &str,
    ) -> Result<ProviderActor, AppointmentError> {
        if user.id.is_empty() {
            return Err(AppointmentError::Unauthenticated);
        }

        let path = format!(
            "/rest/v1/providers?user_id=eq.{}&select=id,hospital_id&limit=1",
            user.id
        );
        let rows: Vec<ProviderRow> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::StoreError(e.to_string()))?;

        let row = rows.into_iter().next().ok_or_else(|| {
            warn!("User {} is not registered as a provider", user.id);
            AppointmentError::Unauthorized("Provider profile not found".to_string())
        })?;

        debug!("Resolved user {} to provider {} at hospital {}", user.id, row.id, row.hospital_id);
        Ok(ProviderActor {
            user_id: user.id.clone(),
            provider_id: row.id,
            hospital_id: row.hospital_id,
        })
    }
}
