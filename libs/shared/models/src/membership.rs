use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A row of the `memberships` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: MembershipStatus,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub quota: i32,
    pub amount: i64,
    pub payment_reference: Option<String>,
    pub member_details: MemberDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    /// Status as of `now`: a stored `active` past its window reads as `expired`.
    pub fn effective_status(&self, now: DateTime<Utc>) -> MembershipStatus {
        match self.status {
            MembershipStatus::Active if self.valid_until <= now => MembershipStatus::Expired,
            status => status,
        }
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == MembershipStatus::Active
    }

    /// Pending or effectively active memberships block a new purchase.
    pub fn blocks_new_purchase(&self, now: DateTime<Utc>) -> bool {
        matches!(
            self.effective_status(now),
            MembershipStatus::Pending | MembershipStatus::Active
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Pending,
    Active,
    Cancelled,
    Expired,
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipStatus::Pending => write!(f, "pending"),
            MembershipStatus::Active => write!(f, "active"),
            MembershipStatus::Cancelled => write!(f, "cancelled"),
            MembershipStatus::Expired => write!(f, "expired"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberDetails {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
}
