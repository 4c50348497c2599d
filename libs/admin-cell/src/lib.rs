//! # Admin Cell
//!
//! Hospital onboarding for platform administrators. Creating a hospital
//! touches the auth service and four tables, so the flow runs as a saga
//! (see [`shared_utils::saga`]) and undoes completed writes when a later one
//! fails.

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{OnboardingError, OnboardHospitalRequest, OnboardedHospital};
pub use router::admin_routes;
pub use services::HospitalOnboardingService;
