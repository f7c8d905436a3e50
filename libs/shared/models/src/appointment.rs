use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::membership::MemberDetails;

// ==============================================================================
// APPOINTMENT RECORD
// ==============================================================================

/// A row of the `appointments` table.
///
/// Bookings and membership purchase artifacts share the table; `record_kind`
/// tells them apart and `metadata` carries the matching variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub doctor_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub record_kind: RecordKind,
    #[serde(default)]
    pub is_free_appointment: bool,
    pub payment_method: Option<PaymentMethod>,
    pub payment_reference: Option<String>,
    pub membership_id: Option<Uuid>,
    pub metadata: AppointmentMetadata,
    pub cancellation: Option<CancellationMetadata>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn is_membership_artifact(&self) -> bool {
        self.record_kind == RecordKind::MembershipPurchase
    }

    pub fn booking_metadata(&self) -> Option<&BookingMetadata> {
        match &self.metadata {
            AppointmentMetadata::Booking(meta) => Some(meta),
            AppointmentMetadata::MembershipPurchase(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    UserCancellationRequested,
    DoctorCancellationRequested,
}

impl AppointmentStatus {
    pub const QUOTA_COUNTED: [AppointmentStatus; 3] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::UserCancellationRequested => "user_cancellation_requested",
            AppointmentStatus::DoctorCancellationRequested => "doctor_cancellation_requested",
        }
    }

    pub fn counts_toward_quota(&self) -> bool {
        Self::QUOTA_COUNTED.contains(self)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Booking,
    MembershipPurchase,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Booking => write!(f, "booking"),
            RecordKind::MembershipPurchase => write!(f, "membership_purchase"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    MembershipFree,
    PayAtClinic,
    Online,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::MembershipFree => write!(f, "membership_free"),
            PaymentMethod::PayAtClinic => write!(f, "pay_at_clinic"),
            PaymentMethod::Online => write!(f, "online"),
        }
    }
}

/// Consultation channel chosen by the patient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationType {
    Online,
    Offline,
}

// ==============================================================================
// METADATA
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppointmentMetadata {
    Booking(BookingMetadata),
    MembershipPurchase(MembershipPurchaseMetadata),
}

impl AppointmentMetadata {
    pub fn record_kind(&self) -> RecordKind {
        match self {
            AppointmentMetadata::Booking(_) => RecordKind::Booking,
            AppointmentMetadata::MembershipPurchase(_) => RecordKind::MembershipPurchase,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingMetadata {
    pub consultation_type: ConsultationType,
    pub payment_method: PaymentMethod,
    pub payment_reference: String,
    pub is_free_appointment: bool,
    pub patient: PatientDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MembershipPurchaseMetadata {
    pub membership_id: Uuid,
    pub member_details: MemberDetails,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientDetails {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub symptoms: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CancellationMetadata {
    pub cancelled_by: CancelledBy,
    pub reason: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    Patient,
    Doctor,
    Admin,
}
