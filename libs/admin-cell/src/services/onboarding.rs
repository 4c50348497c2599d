// libs/admin-cell/src/services/onboarding.rs
use std::future::Future;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_utils::saga::{Saga, SagaError};

use crate::models::{OnboardHospitalRequest, OnboardedHospital, OnboardingError};

const PROVIDER_ROLE: &str = "provider";

pub struct HospitalOnboardingService {
    supabase: Arc<SupabaseClient>,
}

impl HospitalOnboardingService {
    pub fn new(config: &AppConfig) -> Result<Self, OnboardingError> {
        if !config.is_service_role_configured() {
            return Err(OnboardingError::NotConfigured(
                "service role credentials missing".to_string(),
            ));
        }
        Ok(Self::with_client(Arc::new(SupabaseClient::with_service_role(config))))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Creates the provider's auth account, its `users` row, the hospital, the
    /// provider profile and the hospital's departments, in that order. A failing
    /// step rolls back everything created before it.
    pub async fn onboard(
        &self,
        request: OnboardHospitalRequest,
    ) -> Result<OnboardedHospital, OnboardingError> {
        request.validate()?;
        info!("Onboarding hospital {}", request.hospital_name);

        let mut saga = Saga::new(format!("onboard-hospital:{}", request.hospital_name));

        let user_id = saga
            .step(
                "auth_user",
                self.create_auth_user(&request),
                |id| delete_auth_user(Arc::clone(&self.supabase), *id),
            )
            .await
            .map_err(step_failed)?;

        saga.step(
            "users",
            self.insert_one("users", json!({
                "id": user_id,
                "email": request.email,
                "full_name": request.provider_name,
                "role": PROVIDER_ROLE,
            })),
            |id| delete_rows(Arc::clone(&self.supabase), format!("/rest/v1/users?id=eq.{}", id)),
        )
        .await
        .map_err(step_failed)?;

        let hospital_id = saga
            .step(
                "hospitals",
                self.insert_one("hospitals", json!({
                    "name": request.hospital_name,
                    "address": request.address,
                    "phone": request.phone,
                    "email": request.email,
                })),
                |id| delete_rows(Arc::clone(&self.supabase), format!("/rest/v1/hospitals?id=eq.{}", id)),
            )
            .await
            .map_err(step_failed)?;

        let provider_id = saga
            .step(
                "providers",
                self.insert_one("providers", json!({
                    "user_id": user_id,
                    "hospital_id": hospital_id,
                    "full_name": request.provider_name,
                    "email": request.email,
                })),
                |id| delete_rows(Arc::clone(&self.supabase), format!("/rest/v1/providers?id=eq.{}", id)),
            )
            .await
            .map_err(step_failed)?;

        let department_ids = if request.departments.is_empty() {
            Vec::new()
        } else {
            let rows: Vec<Value> = request
                .departments
                .iter()
                .map(|name| json!({ "hospital_id": hospital_id, "name": name.trim() }))
                .collect();

            saga.step(
                "departments",
                self.insert_many("departments", Value::Array(rows)),
                move |_| delete_rows(
                    Arc::clone(&self.supabase),
                    format!("/rest/v1/departments?hospital_id=eq.{}", hospital_id),
                ),
            )
            .await
            .map_err(step_failed)?
        };

        saga.commit();
        info!("Hospital {} onboarded as {}", request.hospital_name, hospital_id);

        Ok(OnboardedHospital {
            user_id,
            hospital_id,
            provider_id,
            department_ids,
        })
    }

    async fn create_auth_user(&self, request: &OnboardHospitalRequest) -> Result<Uuid> {
        let user = self.supabase
            .create_auth_user(
                &request.email,
                &request.password,
                PROVIDER_ROLE,
                json!({ "full_name": request.provider_name }),
            )
            .await?;
        row_id(&user)
    }

    async fn insert_one(&self, table: &str, body: Value) -> Result<Uuid> {
        self.insert_many(table, body)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Insert into {} returned no row", table))
    }

    async fn insert_many(&self, table: &str, body: Value) -> Result<Vec<Uuid>> {
        let rows: Vec<Value> = self.supabase
            .request_with_headers(
                Method::POST,
                &format!("/rest/v1/{}", table),
                None,
                Some(body),
                Some(SupabaseClient::representation_headers()),
            )
            .await?;

        rows.iter().map(row_id).collect()
    }
}

fn row_id(row: &Value) -> Result<Uuid> {
    row.get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Response row has no id"))?
        .parse()
        .map_err(|e| anyhow!("Invalid row id: {}", e))
}

fn delete_auth_user(
    supabase: Arc<SupabaseClient>,
    user_id: Uuid,
) -> impl Future<Output = Result<()>> + Send + 'static {
    async move { supabase.delete_auth_user(&user_id.to_string()).await }
}

fn delete_rows(
    supabase: Arc<SupabaseClient>,
    path: String,
) -> impl Future<Output = Result<()>> + Send + 'static {
    async move { supabase.execute(Method::DELETE, &path, None, None).await }
}

fn step_failed(e: SagaError) -> OnboardingError {
    let SagaError::StepFailed { step, source, compensation_failures } = e;
    if !compensation_failures.is_empty() {
        warn!(
            "Onboarding left partial data behind, compensations failed for: {:?}",
            compensation_failures
        );
    }
    OnboardingError::StepFailed {
        step,
        message: source.to_string(),
        compensation_failures,
    }
}
