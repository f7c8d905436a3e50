// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::UserCancellationRequested,
                AppointmentStatus::DoctorCancellationRequested,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::UserCancellationRequested,
                AppointmentStatus::DoctorCancellationRequested,
            ],
            AppointmentStatus::UserCancellationRequested
            | AppointmentStatus::DoctorCancellationRequested => vec![
                AppointmentStatus::Cancelled,
                AppointmentStatus::Confirmed,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
        }
    }

    /// Patients cancel directly only before the consultation has happened.
    pub fn validate_patient_cancellation(&self, current_status: AppointmentStatus) -> Result<(), AppointmentError> {
        match current_status {
            AppointmentStatus::Pending | AppointmentStatus::Confirmed => Ok(()),
            other => Err(AppointmentError::InvalidStatusTransition {
                from: other,
                to: AppointmentStatus::Cancelled,
            }),
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AppointmentStatus::*;

    #[test]
    fn test_allowed_transitions() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle.validate_status_transition(Pending, Confirmed).is_ok());
        assert!(lifecycle.validate_status_transition(Confirmed, Completed).is_ok());
        assert!(lifecycle.validate_status_transition(Confirmed, UserCancellationRequested).is_ok());
        assert!(lifecycle.validate_status_transition(DoctorCancellationRequested, Cancelled).is_ok());
        assert!(lifecycle.validate_status_transition(UserCancellationRequested, Confirmed).is_ok());
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        let lifecycle = AppointmentLifecycleService::new();
        for next in [Pending, Confirmed, Completed, Cancelled, UserCancellationRequested] {
            assert!(lifecycle.validate_status_transition(Completed, next).is_err());
            assert!(lifecycle.validate_status_transition(Cancelled, next).is_err());
        }
        assert!(lifecycle.validate_status_transition(Pending, Completed).is_err());
    }

    #[test]
    fn test_restored_cancellation_request_counts_toward_quota_again() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle.validate_status_transition(Confirmed, UserCancellationRequested).is_ok());
        assert!(!UserCancellationRequested.counts_toward_quota());

        assert!(lifecycle.validate_status_transition(UserCancellationRequested, Confirmed).is_ok());
        assert!(Confirmed.counts_toward_quota());
    }

    #[test]
    fn test_patient_cancellation() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle.validate_patient_cancellation(Pending).is_ok());
        assert!(lifecycle.validate_patient_cancellation(Confirmed).is_ok());
        assert!(lifecycle.validate_patient_cancellation(Completed).is_err());
        assert!(lifecycle.validate_patient_cancellation(UserCancellationRequested).is_err());
    }
}
