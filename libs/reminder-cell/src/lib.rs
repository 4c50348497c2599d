//! # Reminder Cell
//!
//! Cron-triggered reminders for confirmed appointments. Each sweep looks for
//! appointments starting roughly 48 hours, 24 hours and 2 hours out, sends an
//! SMS (plus an email for the 24 hour reminder) and records every attempt in
//! the `notifications` table. A recorded successful SMS suppresses repeats of
//! the same reminder type.

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{ReminderError, ReminderType, SweepSummary};
pub use router::reminder_routes;
pub use services::ReminderScheduler;
