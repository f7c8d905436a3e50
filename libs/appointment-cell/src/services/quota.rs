// libs/appointment-cell/src/services/quota.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use membership_cell::MembershipStore;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::AuthContext;

use crate::models::{AppointmentError, QuotaStatus};
use crate::services::store::AppointmentStore;

/// Derives a user's free-appointment entitlement from current store state.
///
/// Nothing is cached: every call re-reads the active membership and the
/// free-booking count. Two bookings evaluated concurrently can both see
/// `remaining > 0`; the store has no conditional insert to close that gap.
///
/// Staff status updates can also push `used_count` past the quota. A free
/// booking in `user_cancellation_requested` or `doctor_cancellation_requested`
/// is not counted, so its unit can be spent on a new free booking; moving the
/// old one back to `confirmed` counts it again without any quota check.
/// Both cases clamp `remaining` to 0 and nothing is revoked.
pub struct QuotaEvaluator {
    memberships: MembershipStore,
    appointments: AppointmentStore,
}

impl QuotaEvaluator {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self {
            memberships: MembershipStore::new(Arc::clone(&supabase)),
            appointments: AppointmentStore::new(supabase),
        }
    }

    pub async fn evaluate_quota(&self, ctx: &AuthContext) -> Result<QuotaStatus, AppointmentError> {
        self.evaluate_quota_at(ctx, Utc::now()).await
    }

    pub async fn evaluate_quota_at(
        &self,
        ctx: &AuthContext,
        now: DateTime<Utc>,
    ) -> Result<QuotaStatus, AppointmentError> {
        let user_id = ctx.user_id()
            .map_err(|e| AppointmentError::Unauthorized(e.to_string()))?;

        let membership = self.memberships.find_active(user_id, now, ctx.token()).await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let Some(membership) = membership else {
            debug!("User {} has no active membership", user_id);
            return Ok(QuotaStatus::no_membership());
        };

        let used_count = self.appointments.count_free_bookings(user_id, ctx.token()).await?;
        let quota = QuotaStatus::for_membership(&membership, used_count);

        info!(
            "Quota for user {}: {}/{} used, {} remaining",
            user_id, quota.used_count, quota.included_quota, quota.remaining
        );
        Ok(quota)
    }
}
