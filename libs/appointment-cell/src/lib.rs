//! # Appointment Cell
//!
//! Booking requests and their review workflow:
//!
//! ```text
//! pending --approve--> confirmed --cancel--> cancelled
//!    |  \--reject---> rejected
//!    |   \--suggest--> suggested --accept--> confirmed
//!    |                     \------decline--> cancelled
//!    \--cancel--> cancelled
//! ```
//!
//! Patients create, cancel and answer suggestions; providers approve, reject
//! or propose another slot for requests at their own hospital. Callers are
//! resolved to a [`models::PatientActor`] or [`models::ProviderActor`] at the
//! HTTP boundary and every service call takes that actor explicitly.

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Appointment, AppointmentError, AppointmentStatus};
pub use router::{appointment_routes, provider_routes};
pub use services::AppointmentBookingService;
