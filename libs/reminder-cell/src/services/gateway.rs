// libs/reminder-cell/src/services/gateway.rs
use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::models::{
    ChannelOutcome, GatewayOutcome, ReminderError, ReminderPayload, ReminderType, SendOptions,
};

/// Outbound SMS and email delivery through the notification provider.
pub struct NotificationGateway {
    client: Client,
    sms_url: String,
    email_url: String,
    api_token: String,
}

impl NotificationGateway {
    pub fn new(config: &AppConfig) -> Result<Self, ReminderError> {
        if !config.is_notification_configured() {
            return Err(ReminderError::NotConfigured(
                "notification gateway credentials missing".to_string(),
            ));
        }

        Ok(Self {
            client: Client::new(),
            sms_url: config.notification_sms_url.clone(),
            email_url: config.notification_email_url.clone(),
            api_token: config.notification_api_token.clone(),
        })
    }

    /// Sends the reminder on each requested channel. Channels never affect each
    /// other; every attempted channel reports its own outcome.
    pub async fn send(
        &self,
        reminder_type: ReminderType,
        payload: &ReminderPayload,
        options: SendOptions,
    ) -> GatewayOutcome {
        let mut outcome = GatewayOutcome::default();

        if options.send_sms {
            outcome.sms = Some(self.send_sms(reminder_type, payload).await);
        }
        if options.send_email {
            outcome.email = Some(self.send_email(reminder_type, payload).await);
        }

        outcome
    }

    async fn send_sms(&self, reminder_type: ReminderType, payload: &ReminderPayload) -> ChannelOutcome {
        let message = sms_text(reminder_type, payload);

        let Some(phone) = payload.phone.clone().filter(|p| !p.trim().is_empty()) else {
            return ChannelOutcome {
                success: false,
                recipient: None,
                message,
                error: Some("Patient has no phone number".to_string()),
            };
        };

        let body = json!({ "to": phone, "message": message });
        let error = self.post(&self.sms_url, body).await.err();
        if error.is_none() {
            info!("Sent {} SMS reminder for {}", reminder_type, payload.reference_number);
        }

        ChannelOutcome {
            success: error.is_none(),
            recipient: Some(phone),
            message,
            error,
        }
    }

    async fn send_email(&self, reminder_type: ReminderType, payload: &ReminderPayload) -> ChannelOutcome {
        let message = email_text(reminder_type, payload);

        let Some(email) = payload.email.clone().filter(|e| !e.trim().is_empty()) else {
            return ChannelOutcome {
                success: false,
                recipient: None,
                message,
                error: Some("Patient has no email address".to_string()),
            };
        };

        let body = json!({
            "to": email,
            "subject": format!("Appointment reminder - {}", payload.reference_number),
            "text": message,
        });
        let error = self.post(&self.email_url, body).await.err();
        if error.is_none() {
            info!("Sent {} email reminder for {}", reminder_type, payload.reference_number);
        }

        ChannelOutcome {
            success: error.is_none(),
            recipient: Some(email),
            message,
            error,
        }
    }

    async fn post(&self, url: &str, body: serde_json::Value) -> Result<(), String> {
        debug!("Posting notification to {}", url);

        let response = self.client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Notification request to {} failed: {}", url, e);
                e.to_string()
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("Notification provider returned {}: {}", status, text);
            return Err(format!("HTTP {}: {}", status, text));
        }

        Ok(())
    }
}

pub fn sms_text(reminder_type: ReminderType, payload: &ReminderPayload) -> String {
    format!(
        "Reminder: your appointment {} at {} ({}) is in {}, on {} at {}.",
        payload.reference_number,
        payload.hospital_name,
        payload.department_name,
        reminder_type.marker(),
        payload.appointment_date.format("%d %b %Y"),
        payload.start_time.format("%H:%M"),
    )
}

pub fn email_text(reminder_type: ReminderType, payload: &ReminderPayload) -> String {
    format!(
        "Dear {},\n\nThis is a reminder that your appointment {} is in {}.\n\n\
         Hospital: {}\nDepartment: {}\nDate: {}\nTime: {}\n\n\
         If you can no longer attend, please cancel the appointment so the slot can be offered to someone else.",
        payload.patient_name,
        payload.reference_number,
        reminder_type.marker(),
        payload.hospital_name,
        payload.department_name,
        payload.appointment_date.format("%A, %d %B %Y"),
        payload.start_time.format("%H:%M"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use uuid::Uuid;

    fn payload() -> ReminderPayload {
        ReminderPayload {
            appointment_id: Uuid::nil(),
            reference_number: "MG-20260310-AB12".to_string(),
            patient_name: "Ada".to_string(),
            phone: Some("+15550001".to_string()),
            email: None,
            hospital_name: "General".to_string(),
            department_name: "Cardiology".to_string(),
            appointment_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        }
    }

    #[test]
    fn message_text_carries_type_marker() {
        let sms = sms_text(ReminderType::H48, &payload());
        assert!(sms.contains("48 hours"));
        assert!(sms.contains("MG-20260310-AB12"));
        assert!(sms.contains("14:00"));

        let email = email_text(ReminderType::H24, &payload());
        assert!(email.contains("24 hours"));
        assert!(email.starts_with("Dear Ada"));
    }

    #[tokio::test]
    async fn missing_contact_fails_channel_without_calling_provider() {
        let config = shared_utils::test_utils::TestConfig::default().to_app_config();
        let gateway = NotificationGateway::new(&config).unwrap();

        let outcome = gateway
            .send(ReminderType::H24, &payload(), SendOptions { send_sms: false, send_email: true })
            .await;

        assert!(outcome.sms.is_none());
        let email = outcome.email.unwrap();
        assert!(!email.success);
        assert_eq!(email.error.as_deref(), Some("Patient has no email address"));
    }
}
