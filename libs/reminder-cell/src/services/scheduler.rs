// libs/reminder-cell/src/services/scheduler.rs
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{error, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    ChannelOutcome, NewNotificationRecord, NotificationChannel, NotificationStatus,
    ReminderCandidate, ReminderError, ReminderType, SweepSummary, TypeSummary,
};
use crate::services::gateway::NotificationGateway;
use crate::services::store::NotificationStore;

/// Periodic sweep that sends 48h, 24h and 2h reminders for confirmed appointments.
///
/// Safe to run repeatedly: an appointment is skipped for a type once an SMS of
/// that type has been recorded as sent.
pub struct ReminderScheduler {
    store: NotificationStore,
    gateway: NotificationGateway,
    clinic_offset: FixedOffset,
    budget: Duration,
}

impl ReminderScheduler {
    pub fn new(config: &AppConfig) -> Result<Self, ReminderError> {
        if !config.is_service_role_configured() {
            return Err(ReminderError::NotConfigured(
                "service role credentials missing".to_string(),
            ));
        }

        let supabase = Arc::new(SupabaseClient::with_service_role(config));
        let clinic_offset = FixedOffset::east_opt(config.clinic_utc_offset_minutes * 60)
            .ok_or_else(|| {
                ReminderError::NotConfigured(format!(
                    "invalid clinic UTC offset: {} minutes",
                    config.clinic_utc_offset_minutes
                ))
            })?;

        Ok(Self {
            store: NotificationStore::new(supabase),
            gateway: NotificationGateway::new(config)?,
            clinic_offset,
            budget: Duration::from_secs(config.reminder_sweep_budget_secs),
        })
    }

    pub async fn run_sweep(&self) -> SweepSummary {
        self.run_sweep_at(Utc::now()).await
    }

    pub async fn run_sweep_at(&self, now: DateTime<Utc>) -> SweepSummary {
        info!("Starting reminder sweep at {}", now);
        let started = Instant::now();
        let mut summary = SweepSummary::new(now);

        for reminder_type in ReminderType::SWEEP_ORDER {
            let mut type_summary = TypeSummary::default();

            match self.sweep_type(reminder_type, now, started, &mut type_summary).await {
                Ok(exhausted) => summary.budget_exhausted |= exhausted,
                Err(e) => {
                    error!("Reminder sweep for {} failed: {}", reminder_type, e);
                    type_summary.error = Some(e.to_string());
                }
            }

            *summary.for_type_mut(reminder_type) = type_summary;

            let totals = summary.for_type(reminder_type);
            info!(
                "{} reminders: {} sent, {} failed, {} skipped, {} unrecorded",
                reminder_type, totals.sent, totals.failed, totals.skipped, totals.unrecorded
            );
        }

        if summary.budget_exhausted {
            warn!("Reminder sweep ran out of time, remaining reminders left for the next run");
        }
        info!("Reminder sweep finished in {}ms", started.elapsed().as_millis());

        summary
    }

    /// Returns whether the execution budget ran out before every due
    /// appointment of this type was handled.
    async fn sweep_type(
        &self,
        reminder_type: ReminderType,
        now: DateTime<Utc>,
        started: Instant,
        summary: &mut TypeSummary,
    ) -> Result<bool, ReminderError> {
        let due = self.due_appointments(reminder_type, now).await?;
        if due.is_empty() {
            return Ok(false);
        }

        let ids: Vec<_> = due.iter().map(|c| c.id).collect();
        let already_sent = self.store.sent_sms_for(reminder_type, &ids).await?;

        let pending: Vec<_> = due
            .into_iter()
            .filter(|c| !already_sent.contains(&c.id))
            .collect();

        for (index, candidate) in pending.iter().enumerate() {
            if started.elapsed() >= self.budget {
                summary.skipped += (pending.len() - index) as u32;
                return Ok(true);
            }

            match self.dispatch(reminder_type, candidate).await {
                Ok(Delivery::Recorded) => summary.sent += 1,
                Ok(Delivery::Unrecorded(e)) => {
                    summary.sent += 1;
                    summary.unrecorded += 1;
                    summary.error = Some(format!(
                        "{} delivered reminders could not be recorded and may repeat: {}",
                        summary.unrecorded, e
                    ));
                }
                Err(e) => {
                    warn!(
                        "{} reminder for appointment {} failed: {}",
                        reminder_type, candidate.reference_number, e
                    );
                    summary.failed += 1;
                }
            }
        }

        Ok(false)
    }

    async fn due_appointments(
        &self,
        reminder_type: ReminderType,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReminderCandidate>, ReminderError> {
        let window = reminder_type.window(now);
        let (from, to) = window.date_range(&self.clinic_offset);

        let candidates = self.store.appointments_between(from, to).await?;

        Ok(candidates
            .into_iter()
            .filter(|c| {
                c.starts_at(&self.clinic_offset)
                    .is_some_and(|start| window.contains(start))
            })
            .collect())
    }

    /// Succeeds when the SMS was delivered. Email outcome is recorded but does
    /// not decide the result.
    async fn dispatch(
        &self,
        reminder_type: ReminderType,
        candidate: &ReminderCandidate,
    ) -> Result<Delivery, ReminderError> {
        let payload = candidate.payload();
        let outcome = self.gateway
            .send(reminder_type, &payload, reminder_type.send_options())
            .await;

        if let Some(email) = &outcome.email {
            if !email.success {
                warn!(
                    "Email reminder for {} failed: {}",
                    candidate.reference_number,
                    email.error.as_deref().unwrap_or("unknown error")
                );
            }
            if let Err(e) = self.record(reminder_type, candidate, NotificationChannel::Email, email).await {
                error!("Failed to record email notification for {}: {}", candidate.reference_number, e);
            }
        }

        let Some(sms) = &outcome.sms else {
            return Err(ReminderError::GatewayError("SMS was not attempted".to_string()));
        };

        let recorded = self.record(reminder_type, candidate, NotificationChannel::Sms, sms).await;

        if !sms.success {
            if let Err(e) = recorded {
                error!("Failed to record SMS failure for {}: {}", candidate.reference_number, e);
            }
            return Err(ReminderError::GatewayError(
                sms.error.clone().unwrap_or_else(|| "SMS not delivered".to_string()),
            ));
        }

        match recorded {
            Ok(()) => Ok(Delivery::Recorded),
            Err(e) => {
                error!(
                    "SMS reminder for {} was delivered but not recorded, dedup cannot see it: {}",
                    candidate.reference_number, e
                );
                Ok(Delivery::Unrecorded(e))
            }
        }
    }

    async fn record(
        &self,
        reminder_type: ReminderType,
        candidate: &ReminderCandidate,
        channel: NotificationChannel,
        outcome: &ChannelOutcome,
    ) -> Result<(), ReminderError> {
        let record = NewNotificationRecord {
            appointment_id: candidate.id,
            channel,
            reminder_type,
            recipient: outcome.recipient.clone(),
            message: outcome.message.clone(),
            status: if outcome.success {
                NotificationStatus::Sent
            } else {
                NotificationStatus::Failed
            },
            error_message: outcome.error.clone(),
            created_at: Utc::now(),
        };

        self.store.record(&record).await
    }
}

/// Result of a delivered SMS reminder.
enum Delivery {
    Recorded,
    /// Sent, but the `sent` record is missing so a later sweep may repeat it.
    Unrecorded(ReminderError),
}
