// libs/reminder-cell/src/models.rs
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// REMINDER TYPES & WINDOWS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ReminderType {
    #[serde(rename = "48h")]
    H48,
    #[serde(rename = "24h")]
    H24,
    #[serde(rename = "2h")]
    H2,
}

impl ReminderType {
    /// Sweep order. Closest appointments go first so a sweep cut short by its
    /// budget only defers reminders that still have later windows to land in.
    pub const SWEEP_ORDER: [ReminderType; 3] = [ReminderType::H2, ReminderType::H24, ReminderType::H48];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderType::H48 => "48h",
            ReminderType::H24 => "24h",
            ReminderType::H2 => "2h",
        }
    }

    /// Phrase embedded in message text.
    pub fn marker(&self) -> &'static str {
        match self {
            ReminderType::H48 => "48 hours",
            ReminderType::H24 => "24 hours",
            ReminderType::H2 => "2 hours",
        }
    }

    pub fn offset(&self) -> Duration {
        match self {
            ReminderType::H48 => Duration::hours(48),
            ReminderType::H24 => Duration::hours(24),
            ReminderType::H2 => Duration::hours(2),
        }
    }

    pub fn half_width(&self) -> Duration {
        match self {
            ReminderType::H48 | ReminderType::H24 => Duration::hours(1),
            ReminderType::H2 => Duration::minutes(30),
        }
    }

    pub fn send_options(&self) -> SendOptions {
        SendOptions {
            send_sms: true,
            send_email: *self == ReminderType::H24,
        }
    }

    pub fn window(&self, now: DateTime<Utc>) -> ReminderWindow {
        let center = now + self.offset();
        ReminderWindow {
            start: center - self.half_width(),
            end: center + self.half_width(),
        }
    }
}

impl fmt::Display for ReminderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive instant range an appointment must start in to be due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReminderWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }

    /// Clinic-local calendar days touched by the window, for the coarse date prefilter.
    pub fn date_range(&self, clinic_offset: &FixedOffset) -> (NaiveDate, NaiveDate) {
        (
            self.start.with_timezone(clinic_offset).date_naive(),
            self.end.with_timezone(clinic_offset).date_naive(),
        )
    }
}

// ==============================================================================
// DUE APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientContact {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

/// Confirmed appointment row with the embedded details a reminder needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderCandidate {
    pub id: Uuid,
    pub reference_number: String,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    #[serde(rename = "patients")]
    pub patient: Option<PatientContact>,
    #[serde(rename = "hospitals")]
    pub hospital: Option<NamedRef>,
    #[serde(rename = "departments")]
    pub department: Option<NamedRef>,
}

impl ReminderCandidate {
    /// Appointment start as an instant, reading the stored date and time as clinic-local.
    pub fn starts_at(&self, clinic_offset: &FixedOffset) -> Option<DateTime<Utc>> {
        clinic_offset
            .from_local_datetime(&self.appointment_date.and_time(self.start_time))
            .single()
            .map(|local| local.with_timezone(&Utc))
    }

    pub fn payload(&self) -> ReminderPayload {
        let patient = self.patient.clone().unwrap_or(PatientContact {
            full_name: None,
            phone: None,
            email: None,
        });

        ReminderPayload {
            appointment_id: self.id,
            reference_number: self.reference_number.clone(),
            patient_name: patient.full_name.unwrap_or_else(|| "Patient".to_string()),
            phone: patient.phone,
            email: patient.email,
            hospital_name: self.hospital.as_ref().map(|h| h.name.clone()).unwrap_or_default(),
            department_name: self.department.as_ref().map(|d| d.name.clone()).unwrap_or_default(),
            appointment_date: self.appointment_date,
            start_time: self.start_time,
        }
    }
}

// ==============================================================================
// NOTIFICATIONS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Sms,
    Email,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Sent,
    Failed,
}

/// Append-only evidence that a reminder was attempted on one channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotificationRecord {
    pub appointment_id: Uuid,
    pub channel: NotificationChannel,
    pub reminder_type: ReminderType,
    pub recipient: Option<String>,
    pub message: String,
    pub status: NotificationStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderPayload {
    pub appointment_id: Uuid,
    pub reference_number: String,
    pub patient_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub hospital_name: String,
    pub department_name: String,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    pub send_sms: bool,
    pub send_email: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelOutcome {
    pub success: bool,
    pub recipient: Option<String>,
    pub message: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GatewayOutcome {
    pub sms: Option<ChannelOutcome>,
    pub email: Option<ChannelOutcome>,
}

// ==============================================================================
// SWEEP SUMMARY
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TypeSummary {
    pub sent: u32,
    pub failed: u32,
    /// Due but left for the next sweep because the execution budget ran out.
    pub skipped: u32,
    /// Delivered SMS whose notification record could not be stored. These
    /// are invisible to dedup and may be sent again by a later sweep.
    #[serde(default)]
    pub unrecorded: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepSummary {
    #[serde(rename = "48h")]
    pub h48: TypeSummary,
    #[serde(rename = "24h")]
    pub h24: TypeSummary,
    #[serde(rename = "2h")]
    pub h2: TypeSummary,
    pub budget_exhausted: bool,
    pub timestamp: DateTime<Utc>,
}

impl SweepSummary {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            h48: TypeSummary::default(),
            h24: TypeSummary::default(),
            h2: TypeSummary::default(),
            budget_exhausted: false,
            timestamp,
        }
    }

    pub fn for_type(&self, reminder_type: ReminderType) -> &TypeSummary {
        match reminder_type {
            ReminderType::H48 => &self.h48,
            ReminderType::H24 => &self.h24,
            ReminderType::H2 => &self.h2,
        }
    }

    pub fn for_type_mut(&mut self, reminder_type: ReminderType) -> &mut TypeSummary {
        match reminder_type {
            ReminderType::H48 => &mut self.h48,
            ReminderType::H24 => &mut self.h24,
            ReminderType::H2 => &mut self.h2,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ReminderError {
    #[error("Reminder scheduler not configured: {0}")]
    NotConfigured(String),

    #[error("Database error: {0}")]
    StoreError(String),

    #[error("Notification dispatch failed: {0}")]
    GatewayError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn windows_are_centered_with_inclusive_bounds() {
        let now = at("2026-03-09T14:00:00Z");

        let day = ReminderType::H24.window(now);
        assert_eq!(day.start, at("2026-03-10T13:00:00Z"));
        assert_eq!(day.end, at("2026-03-10T15:00:00Z"));
        assert!(day.contains(day.start));
        assert!(day.contains(day.end));
        assert!(!day.contains(day.end + Duration::seconds(1)));

        let soon = ReminderType::H2.window(now);
        assert_eq!(soon.start, at("2026-03-09T15:30:00Z"));
        assert_eq!(soon.end, at("2026-03-09T16:30:00Z"));
    }

    #[test]
    fn windows_never_overlap_each_other() {
        let now = at("2026-03-09T14:00:00Z");
        let windows: Vec<_> = ReminderType::SWEEP_ORDER.iter().map(|t| t.window(now)).collect();

        for (i, a) in windows.iter().enumerate() {
            for b in windows.iter().skip(i + 1) {
                assert!(a.end < b.start || b.end < a.start, "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn date_range_spans_midnight() {
        let now = at("2026-03-08T23:30:00Z");
        let window = ReminderType::H48.window(now);

        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(
            window.date_range(&utc),
            (
                NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
                NaiveDate::from_ymd_opt(2026, 3, 11).unwrap()
            )
        );
    }

    #[test]
    fn only_day_before_reminder_sends_email() {
        assert!(ReminderType::H24.send_options().send_email);
        assert!(!ReminderType::H48.send_options().send_email);
        assert!(!ReminderType::H2.send_options().send_email);
        assert!(ReminderType::SWEEP_ORDER.iter().all(|t| t.send_options().send_sms));
    }

    #[test]
    fn candidate_start_honours_clinic_offset() {
        let candidate = ReminderCandidate {
            id: Uuid::nil(),
            reference_number: "MG-20260310-AB12".to_string(),
            appointment_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            patient: None,
            hospital: None,
            department: None,
        };

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(candidate.starts_at(&plus_two), Some(at("2026-03-10T12:00:00Z")));
        assert_eq!(candidate.payload().patient_name, "Patient");
    }

    #[test]
    fn summary_serializes_type_keys() {
        let summary = SweepSummary::new(at("2026-03-09T14:00:00Z"));
        let value = serde_json::to_value(&summary).unwrap();

        for key in ["48h", "24h", "2h", "timestamp"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["24h"]["sent"], 0);
    }
}
