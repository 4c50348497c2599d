// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

pub struct AppointmentLifecycleService;

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidState(*current_status));
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Rejected,
                AppointmentStatus::Suggested,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Suggested => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Cancelled,
                AppointmentStatus::Completed,
            ],
            AppointmentStatus::Scheduled => vec![AppointmentStatus::Completed],
            // Terminal states - no transitions allowed
            AppointmentStatus::Rejected => vec![],
            AppointmentStatus::Cancelled => vec![],
            AppointmentStatus::Completed => vec![],
        }
    }

    /// Provider review actions (approve, reject, suggest) only apply to pending requests.
    pub fn ensure_reviewable(&self, current_status: &AppointmentStatus) -> Result<(), AppointmentError> {
        if *current_status != AppointmentStatus::Pending {
            warn!("Review attempted on appointment in status {}", current_status);
            return Err(AppointmentError::InvalidState(*current_status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentStatus::*;

    const ALL: [AppointmentStatus; 7] =
        [Pending, Confirmed, Rejected, Suggested, Cancelled, Completed, Scheduled];

    #[test]
    fn terminal_states_have_no_exits() {
        let service = AppointmentLifecycleService::new();
        for status in [Rejected, Cancelled, Completed] {
            assert!(service.get_valid_transitions(&status).is_empty(), "{status} should be terminal");
        }
    }

    #[test]
    fn suggested_only_resolves_to_confirmed_or_cancelled() {
        let service = AppointmentLifecycleService::new();
        assert!(service.validate_status_transition(&Suggested, &Confirmed).is_ok());
        assert!(service.validate_status_transition(&Suggested, &Cancelled).is_ok());
        assert_eq!(
            service.validate_status_transition(&Suggested, &Rejected),
            Err(AppointmentError::InvalidState(Suggested))
        );
    }

    #[test]
    fn nothing_transitions_back_to_pending() {
        let service = AppointmentLifecycleService::new();
        for status in ALL {
            assert!(!service.get_valid_transitions(&status).contains(&Pending));
        }
    }

    #[test]
    fn only_pending_is_reviewable() {
        let service = AppointmentLifecycleService::new();
        for status in ALL {
            assert_eq!(service.ensure_reviewable(&status).is_ok(), status == Pending);
        }
    }
}
