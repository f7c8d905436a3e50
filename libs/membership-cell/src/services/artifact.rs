// libs/membership-cell/src/services/artifact.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;
use shared_models::appointment::{
    AppointmentMetadata, AppointmentStatus, MembershipPurchaseMetadata, RecordKind,
};
use shared_models::membership::Membership;

use crate::models::MembershipError;

/// Appointment-shaped rows that surface membership purchases on the
/// appointment-centric admin dashboards.
///
/// Every write here is secondary: the membership row is the source of truth.
pub struct MembershipArtifactStore {
    supabase: Arc<SupabaseClient>,
}

impl MembershipArtifactStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn create(
        &self,
        membership: &Membership,
        now: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Uuid, MembershipError> {
        let metadata = AppointmentMetadata::MembershipPurchase(MembershipPurchaseMetadata {
            membership_id: membership.id,
            member_details: membership.member_details.clone(),
            amount: membership.amount,
        });

        let record = json!({
            "user_id": membership.user_id,
            "doctor_id": null,
            "scheduled_at": now.to_rfc3339(),
            "status": AppointmentStatus::Pending,
            "record_kind": RecordKind::MembershipPurchase,
            "is_free_appointment": false,
            "payment_method": null,
            "payment_reference": membership.payment_reference,
            "membership_id": membership.id,
            "metadata": metadata,
            "cancellation": null,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result = self.supabase.request_returning(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            record,
        ).await.map_err(|e| MembershipError::DatabaseError(e.to_string()))?;

        let artifact_id = result.first()
            .and_then(|row| row.get("id"))
            .and_then(|id| id.as_str())
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or_else(|| MembershipError::DatabaseError(
                "Membership artifact insert returned no id".to_string()
            ))?;

        debug!("Created membership artifact {} for membership {}", artifact_id, membership.id);
        Ok(artifact_id)
    }

    /// Mirror a membership status change onto its artifact, if one resolves.
    pub async fn set_status(
        &self,
        membership_id: Uuid,
        status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<usize, MembershipError> {
        let path = format!(
            "/rest/v1/appointments?membership_id=eq.{}&record_kind=eq.{}",
            membership_id,
            RecordKind::MembershipPurchase,
        );

        let result = self.supabase.request_returning(
            Method::PATCH,
            &path,
            Some(auth_token),
            json!({
                "status": status,
                "updated_at": Utc::now().to_rfc3339()
            }),
        ).await.map_err(|e| MembershipError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            info!("No membership artifact found for membership {}", membership_id);
        }
        Ok(result.len())
    }

    /// Best-effort form of [`Self::set_status`]: failures are logged and swallowed.
    pub async fn cascade_status(&self, membership_id: Uuid, status: AppointmentStatus, auth_token: &str) {
        if let Err(e) = self.set_status(membership_id, status, auth_token).await {
            warn!("Failed to mark artifact of membership {} as {}: {}", membership_id, status, e);
        }
    }
}
