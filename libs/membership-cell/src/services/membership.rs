// libs/membership-cell/src/services/membership.rs
use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::appointment::AppointmentStatus;
use shared_models::auth::AuthContext;
use shared_models::membership::{Membership, MembershipStatus};

use crate::models::{
    validate_member_details, MembershipError, MembershipPlan, PurchaseMembershipRequest,
};
use crate::services::artifact::MembershipArtifactStore;
use crate::services::lifecycle::MembershipLifecycleService;
use crate::services::store::MembershipStore;

/// Membership purchase, approval, cancellation and lazy expiry.
pub struct MembershipService {
    store: MembershipStore,
    artifacts: MembershipArtifactStore,
    lifecycle: MembershipLifecycleService,
    plan: MembershipPlan,
}

impl MembershipService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_plan(config, MembershipPlan::default())
    }

    pub fn with_plan(config: &AppConfig, plan: MembershipPlan) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));

        Self {
            store: MembershipStore::new(Arc::clone(&supabase)),
            artifacts: MembershipArtifactStore::new(supabase),
            lifecycle: MembershipLifecycleService::new(),
            plan,
        }
    }

    pub fn plan(&self) -> &MembershipPlan {
        &self.plan
    }

    pub async fn purchase_membership(
        &self,
        ctx: &AuthContext,
        request: PurchaseMembershipRequest,
    ) -> Result<Membership, MembershipError> {
        self.purchase_membership_at(ctx, request, Utc::now()).await
    }

    /// Create a `pending` membership for the caller.
    ///
    /// The duplicate check is a read immediately before the insert; two
    /// near-simultaneous purchases can both pass it.
    pub async fn purchase_membership_at(
        &self,
        ctx: &AuthContext,
        request: PurchaseMembershipRequest,
        now: DateTime<Utc>,
    ) -> Result<Membership, MembershipError> {
        let user_id = caller_id(ctx)?;
        info!("Membership purchase requested by user {}", user_id);

        validate_member_details(&request.member_details)?;

        let existing = self.store.list_for_user(
            user_id,
            Some(&[MembershipStatus::Pending, MembershipStatus::Active]),
            ctx.token(),
        ).await?;

        let mut blocked = false;
        for membership in &existing {
            if membership.blocks_new_purchase(now) {
                blocked = true;
            } else {
                self.correct_stale_status(membership, now, ctx.token()).await;
            }
        }
        if blocked {
            warn!("User {} already holds a pending or active membership", user_id);
            return Err(MembershipError::DuplicateMembership);
        }

        let valid_until = now
            .checked_add_months(Months::new(self.plan.duration_months))
            .ok_or_else(|| MembershipError::ValidationError("Membership end date out of range".to_string()))?;

        let record = json!({
            "user_id": user_id,
            "status": MembershipStatus::Pending,
            "valid_from": now.to_rfc3339(),
            "valid_until": valid_until.to_rfc3339(),
            "quota": self.plan.quota,
            "amount": self.plan.price,
            "payment_reference": request.payment_reference,
            "member_details": request.member_details,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let membership = self.store.insert(record, ctx.token()).await?;

        if let Err(e) = self.artifacts.create(&membership, now, ctx.token()).await {
            warn!("Membership {} created without admin artifact: {}", membership.id, e);
        }

        info!("Membership {} created in pending state for user {}", membership.id, user_id);
        Ok(membership)
    }

    /// Admin approval: `pending -> active`.
    pub async fn approve_membership(
        &self,
        ctx: &AuthContext,
        membership_id: Uuid,
    ) -> Result<Membership, MembershipError> {
        if !ctx.is_admin() {
            return Err(MembershipError::Unauthorized("Only admins can approve memberships".to_string()));
        }

        let membership = self.store.get(membership_id, ctx.token()).await?;
        let current = membership.effective_status(Utc::now());
        self.lifecycle.validate_status_transition(current, MembershipStatus::Active)?;

        let approved = self.store.update_status(membership_id, MembershipStatus::Active, ctx.token()).await?;
        self.artifacts.cascade_status(membership_id, AppointmentStatus::Confirmed, ctx.token()).await;

        info!("Membership {} approved by {}", membership_id, ctx.user.id);
        Ok(approved)
    }

    /// Admin rejection: `{pending, active} -> cancelled`.
    pub async fn reject_membership(
        &self,
        ctx: &AuthContext,
        membership_id: Uuid,
    ) -> Result<Membership, MembershipError> {
        if !ctx.is_admin() {
            return Err(MembershipError::Unauthorized("Only admins can reject memberships".to_string()));
        }

        let membership = self.store.get(membership_id, ctx.token()).await?;
        self.transition_to_cancelled(ctx, membership).await
    }

    /// Owner or admin cancellation: `{pending, active} -> cancelled`.
    pub async fn cancel_membership(
        &self,
        ctx: &AuthContext,
        membership_id: Uuid,
    ) -> Result<Membership, MembershipError> {
        let membership = self.store.get(membership_id, ctx.token()).await?;

        if !ctx.owns(membership.user_id) && !ctx.is_admin() {
            return Err(MembershipError::Unauthorized("Not authorized to cancel this membership".to_string()));
        }

        self.transition_to_cancelled(ctx, membership).await
    }

    /// The caller's most recent membership with lazy expiry applied.
    pub async fn current_membership(&self, ctx: &AuthContext) -> Result<Option<Membership>, MembershipError> {
        self.current_membership_at(ctx, Utc::now()).await
    }

    pub async fn current_membership_at(
        &self,
        ctx: &AuthContext,
        now: DateTime<Utc>,
    ) -> Result<Option<Membership>, MembershipError> {
        let user_id = caller_id(ctx)?;
        let memberships = self.store.list_for_user(user_id, None, ctx.token()).await?;

        let Some(mut membership) = memberships.into_iter().next() else {
            debug!("User {} has no membership", user_id);
            return Ok(None);
        };

        let effective = membership.effective_status(now);
        if effective != membership.status {
            self.correct_stale_status(&membership, now, ctx.token()).await;
            membership.status = effective;
        }

        Ok(Some(membership))
    }

    /// Staff listing; statuses are reported as of now without persisting corrections.
    pub async fn list_memberships(
        &self,
        ctx: &AuthContext,
        status: Option<MembershipStatus>,
        limit: Option<i32>,
    ) -> Result<Vec<Membership>, MembershipError> {
        if !ctx.is_staff() {
            return Err(MembershipError::Unauthorized("Staff access required".to_string()));
        }

        let now = Utc::now();
        let mut memberships = self.store.list(status, limit, ctx.token()).await?;
        for membership in &mut memberships {
            membership.status = membership.effective_status(now);
        }

        Ok(memberships)
    }

    async fn transition_to_cancelled(
        &self,
        ctx: &AuthContext,
        membership: Membership,
    ) -> Result<Membership, MembershipError> {
        let now = Utc::now();
        let current = membership.effective_status(now);

        if let Err(e) = self.lifecycle.validate_status_transition(current, MembershipStatus::Cancelled) {
            self.correct_stale_status(&membership, now, ctx.token()).await;
            return Err(e);
        }

        let cancelled = self.store
            .update_status(membership.id, MembershipStatus::Cancelled, ctx.token())
            .await?;
        self.artifacts.cascade_status(membership.id, AppointmentStatus::Cancelled, ctx.token()).await;

        info!("Membership {} cancelled by {}", membership.id, ctx.user.id);
        Ok(cancelled)
    }

    /// Persist `expired` for a stored `active` row past its window; failures are only logged.
    async fn correct_stale_status(&self, membership: &Membership, now: DateTime<Utc>, auth_token: &str) {
        let effective = membership.effective_status(now);
        if effective == membership.status {
            return;
        }

        debug!("Correcting stale membership {} from {} to {}", membership.id, membership.status, effective);
        if let Err(e) = self.store.update_status(membership.id, effective, auth_token).await {
            warn!("Failed to persist {} for membership {}: {}", effective, membership.id, e);
        }
    }
}

fn caller_id(ctx: &AuthContext) -> Result<Uuid, MembershipError> {
    ctx.user_id().map_err(|e| MembershipError::Unauthorized(e.to_string()))
}
