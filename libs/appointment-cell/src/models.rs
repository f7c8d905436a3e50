// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use payment_cell::models::PaymentInitiation;
use shared_models::appointment::{ConsultationType, PatientDetails};
use shared_models::membership::Membership;
use shared_utils::validation::validate_phone;

pub use shared_models::appointment::{
    Appointment, AppointmentMetadata, AppointmentStatus, BookingMetadata, CancellationMetadata,
    CancelledBy, PaymentMethod, RecordKind,
};

pub const PAY_AT_CLINIC_REFERENCE: &str = "PAY_AT_CLINIC";
pub const MEMBERSHIP_FREE_REFERENCE: &str = "MEMBERSHIP_FREE";

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// How the patient asked to pay. Quota, when available, overrides it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestedPaymentMethod {
    Online,
    #[serde(alias = "offline")]
    PayAtClinic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub slot: String,
    pub patient_details: PatientDetails,
    pub consultation_type: ConsultationType,
    pub payment_method: RequestedPaymentMethod,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminAppointmentQuery {
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub include_membership_purchases: bool,
    pub limit: Option<i32>,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingOutcome {
    pub appointment: Appointment,
    /// QR payload for online payment; present only on the paid online path.
    pub payment: Option<PaymentInitiation>,
    pub quota_applied: bool,
}

/// Free-appointment entitlement of a user at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub has_active_membership: bool,
    pub included_quota: i64,
    pub used_count: i64,
    pub remaining: i64,
    pub membership_id: Option<Uuid>,
    pub valid_until: Option<DateTime<Utc>>,
}

impl QuotaStatus {
    pub fn no_membership() -> Self {
        Self {
            has_active_membership: false,
            included_quota: 0,
            used_count: 0,
            remaining: 0,
            membership_id: None,
            valid_until: None,
        }
    }

    /// Over-consumption clamps `remaining` at zero; nothing is revoked.
    pub fn for_membership(membership: &Membership, used_count: i64) -> Self {
        let included_quota = i64::from(membership.quota.max(0));

        Self {
            has_active_membership: true,
            included_quota,
            used_count,
            remaining: (included_quota - used_count).max(0),
            membership_id: Some(membership.id),
            valid_until: Some(membership.valid_until),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotInfo {
    pub label: String,
    pub display: String,
    pub scheduled_at: DateTime<Utc>,
    pub selectable: bool,
}

/// The subset of a doctor row needed to price an online consultation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub full_name: String,
    pub consultation_fee: Option<f64>,
}

impl DoctorProfile {
    /// Fee in whole rupees.
    pub fn fee_amount(&self) -> i64 {
        self.consultation_fee.map(|fee| fee.round() as i64).unwrap_or(0)
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Appointment cannot move from {from} to {to}")]
    InvalidStatusTransition { from: AppointmentStatus, to: AppointmentStatus },

    #[error("Payment initiation failed: {0}")]
    PaymentInitiation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

pub fn validate_patient_details(details: &PatientDetails) -> Result<(), AppointmentError> {
    if details.full_name.trim().is_empty() {
        return Err(AppointmentError::ValidationError("Patient name is required".to_string()));
    }
    if !validate_phone(&details.phone) {
        return Err(AppointmentError::ValidationError("A valid patient phone number is required".to_string()));
    }
    if let Some(age) = details.age {
        if age == 0 || age > 120 {
            return Err(AppointmentError::ValidationError(format!("Invalid age: {}", age)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use shared_models::membership::{MemberDetails, MembershipStatus};

    fn membership(quota: i32) -> Membership {
        let now = Utc::now();
        Membership {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            status: MembershipStatus::Active,
            valid_from: now,
            valid_until: now + Duration::days(180),
            quota,
            amount: 3500,
            payment_reference: None,
            member_details: MemberDetails {
                full_name: "Asha Rao".to_string(),
                phone: "9876543210".to_string(),
                email: None,
                age: None,
                gender: None,
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_remaining_never_negative() {
        let m = membership(4);
        for used in 0..10 {
            let quota = QuotaStatus::for_membership(&m, used);
            assert_eq!(quota.remaining, (4 - used).max(0));
            assert!(quota.remaining >= 0);
        }
    }

    #[test]
    fn test_no_membership_has_no_quota() {
        let quota = QuotaStatus::no_membership();
        assert!(!quota.has_active_membership);
        assert_eq!(quota.remaining, 0);
    }

    #[test]
    fn test_requested_payment_accepts_offline_alias() {
        let method: RequestedPaymentMethod = serde_json::from_str("\"offline\"").unwrap();
        assert_eq!(method, RequestedPaymentMethod::PayAtClinic);
    }

    #[test]
    fn test_fee_amount_rounds() {
        let doctor = DoctorProfile {
            id: Uuid::new_v4(),
            full_name: "Dr. Mehta".to_string(),
            consultation_fee: Some(499.6),
        };
        assert_eq!(doctor.fee_amount(), 500);
    }

    #[test]
    fn test_patient_details_validation() {
        let mut details = PatientDetails {
            full_name: "Asha Rao".to_string(),
            phone: "9876543210".to_string(),
            email: None,
            age: Some(30),
            gender: None,
            symptoms: None,
        };
        assert!(validate_patient_details(&details).is_ok());

        details.phone = "  ".to_string();
        assert!(validate_patient_details(&details).is_err());

        details.phone = "not a phone".to_string();
        assert!(validate_patient_details(&details).is_err());

        details.phone = "+91 98765-43210".to_string();
        assert!(validate_patient_details(&details).is_ok());
    }
}
