// libs/membership-cell/src/models.rs
use serde::{Deserialize, Serialize};

use shared_models::membership::{MemberDetails, MembershipStatus};
use shared_utils::validation::validate_phone;

pub use shared_models::membership::Membership;

// ==============================================================================
// PLAN
// ==============================================================================

/// Price point and entitlement of the premium membership.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipPlan {
    pub price: i64,
    pub quota: i32,
    pub duration_months: u32,
}

impl Default for MembershipPlan {
    fn default() -> Self {
        Self {
            price: 3500,
            quota: 4,
            duration_months: 6,
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseMembershipRequest {
    pub member_details: MemberDetails,
    pub payment_reference: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MembershipListQuery {
    pub status: Option<MembershipStatus>,
    pub limit: Option<i32>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum MembershipError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("You already have a pending or active membership")]
    DuplicateMembership,

    #[error("Membership not found")]
    NotFound,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Membership cannot move from {from} to {to}")]
    InvalidStatusTransition { from: MembershipStatus, to: MembershipStatus },

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Checks the fields the purchase form requires.
pub fn validate_member_details(details: &MemberDetails) -> Result<(), MembershipError> {
    if details.full_name.trim().is_empty() {
        return Err(MembershipError::ValidationError("Member name is required".to_string()));
    }

    if !validate_phone(&details.phone) {
        return Err(MembershipError::ValidationError(
            "A valid phone number is required".to_string()
        ));
    }

    if let Some(age) = details.age {
        if age == 0 || age > 120 {
            return Err(MembershipError::ValidationError(format!("Invalid age: {}", age)));
        }
    }

    Ok(())
}
