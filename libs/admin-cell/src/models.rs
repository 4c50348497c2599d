// libs/admin-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct OnboardHospitalRequest {
    pub hospital_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Login email of the hospital's first provider account.
    pub email: String,
    pub password: String,
    pub provider_name: String,
    #[serde(default)]
    pub departments: Vec<String>,
}

impl OnboardHospitalRequest {
    pub fn validate(&self) -> Result<(), OnboardingError> {
        if self.hospital_name.trim().is_empty() {
            return Err(OnboardingError::ValidationError("Hospital name is required".to_string()));
        }
        if self.provider_name.trim().is_empty() {
            return Err(OnboardingError::ValidationError("Provider name is required".to_string()));
        }
        if !self.email.contains('@') {
            return Err(OnboardingError::ValidationError("A valid email is required".to_string()));
        }
        if self.password.len() < MIN_PASSWORD_LENGTH {
            return Err(OnboardingError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if self.departments.iter().any(|d| d.trim().is_empty()) {
            return Err(OnboardingError::ValidationError("Department names cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OnboardedHospital {
    pub user_id: Uuid,
    pub hospital_id: Uuid,
    pub provider_id: Uuid,
    pub department_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum OnboardingError {
    #[error("Administrator role required")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Onboarding failed at {step}: {message}")]
    StepFailed {
        step: String,
        message: String,
        compensation_failures: Vec<String>,
    },

    #[error("Onboarding not configured: {0}")]
    NotConfigured(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request() -> OnboardHospitalRequest {
        OnboardHospitalRequest {
            hospital_name: "General Hospital".to_string(),
            address: None,
            phone: None,
            email: "admin@general.example".to_string(),
            password: "correct-horse".to_string(),
            provider_name: "Dr. Obi".to_string(),
            departments: vec!["Cardiology".to_string()],
        }
    }

    #[test]
    fn accepts_complete_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn rejects_short_password_and_blank_department() {
        let mut short = request();
        short.password = "short".to_string();
        assert_matches!(short.validate(), Err(OnboardingError::ValidationError(_)));

        let mut blank = request();
        blank.departments.push("  ".to_string());
        assert_matches!(blank.validate(), Err(OnboardingError::ValidationError(_)));
    }
}
