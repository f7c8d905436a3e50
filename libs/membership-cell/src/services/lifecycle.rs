// libs/membership-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use shared_models::membership::MembershipStatus;

use crate::models::MembershipError;

pub struct MembershipLifecycleService;

impl MembershipLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: MembershipStatus,
        new_status: MembershipStatus,
    ) -> Result<(), MembershipError> {
        debug!("Validating membership transition {} -> {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid membership transition attempted: {} -> {}", current_status, new_status);
            return Err(MembershipError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    pub fn get_valid_transitions(&self, current_status: MembershipStatus) -> Vec<MembershipStatus> {
        match current_status {
            MembershipStatus::Pending => vec![
                MembershipStatus::Active,
                MembershipStatus::Cancelled,
            ],
            MembershipStatus::Active => vec![
                MembershipStatus::Cancelled,
                MembershipStatus::Expired,
            ],
            // Terminal states
            MembershipStatus::Cancelled => vec![],
            MembershipStatus::Expired => vec![],
        }
    }
}

impl Default for MembershipLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
