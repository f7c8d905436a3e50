// libs/membership-cell/src/services/store.rs
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;
use shared_models::membership::{Membership, MembershipStatus};

use crate::models::MembershipError;

/// Data access for the `memberships` table.
pub struct MembershipStore {
    supabase: Arc<SupabaseClient>,
}

impl MembershipStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn get(&self, membership_id: Uuid, auth_token: &str) -> Result<Membership, MembershipError> {
        debug!("Fetching membership: {}", membership_id);

        let path = format!("/rest/v1/memberships?id=eq.{}", membership_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| MembershipError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .next()
            .ok_or(MembershipError::NotFound)
            .and_then(parse_membership)
    }

    /// A user's memberships, newest first, optionally restricted to `statuses`.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        statuses: Option<&[MembershipStatus]>,
        auth_token: &str,
    ) -> Result<Vec<Membership>, MembershipError> {
        let mut path = format!("/rest/v1/memberships?user_id=eq.{}", user_id);
        if let Some(statuses) = statuses {
            path.push_str(&format!("&status=in.({})", join_statuses(statuses)));
        }
        path.push_str("&order=created_at.desc");

        self.fetch_many(&path, auth_token).await
    }

    /// The user's membership that is active at `now`, if any.
    ///
    /// The window is checked by the query and again in process, so a row
    /// whose stored status is still `active` past `valid_until` never counts.
    pub async fn find_active(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        auth_token: &str,
    ) -> Result<Option<Membership>, MembershipError> {
        let now_str = now.to_rfc3339();
        let path = format!(
            "/rest/v1/memberships?user_id=eq.{}&status=eq.active&valid_until=gt.{}&order=valid_until.desc",
            user_id,
            urlencoding::encode(&now_str),
        );

        let memberships = self.fetch_many(&path, auth_token).await?;
        Ok(memberships.into_iter().find(|m| m.is_active_at(now)))
    }

    pub async fn list(
        &self,
        status: Option<MembershipStatus>,
        limit: Option<i32>,
        auth_token: &str,
    ) -> Result<Vec<Membership>, MembershipError> {
        let mut query_parts = Vec::new();
        if let Some(status) = status {
            query_parts.push(format!("status=eq.{}", status));
        }
        query_parts.push("order=created_at.desc".to_string());
        query_parts.push(format!("limit={}", limit.unwrap_or(100)));

        let path = format!("/rest/v1/memberships?{}", query_parts.join("&"));
        self.fetch_many(&path, auth_token).await
    }

    pub async fn insert(&self, record: Value, auth_token: &str) -> Result<Membership, MembershipError> {
        let result = self.supabase.request_returning(
            Method::POST,
            "/rest/v1/memberships",
            Some(auth_token),
            record,
        ).await.map_err(|e| MembershipError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .next()
            .ok_or_else(|| MembershipError::DatabaseError("Failed to create membership".to_string()))
            .and_then(parse_membership)
    }

    pub async fn update_status(
        &self,
        membership_id: Uuid,
        status: MembershipStatus,
        auth_token: &str,
    ) -> Result<Membership, MembershipError> {
        debug!("Setting membership {} to {}", membership_id, status);

        let path = format!("/rest/v1/memberships?id=eq.{}", membership_id);
        let result = self.supabase.request_returning(
            Method::PATCH,
            &path,
            Some(auth_token),
            json!({
                "status": status,
                "updated_at": Utc::now().to_rfc3339()
            }),
        ).await.map_err(|e| MembershipError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .next()
            .ok_or(MembershipError::NotFound)
            .and_then(parse_membership)
    }

    async fn fetch_many(&self, path: &str, auth_token: &str) -> Result<Vec<Membership>, MembershipError> {
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            path,
            Some(auth_token),
            None,
        ).await.map_err(|e| MembershipError::DatabaseError(e.to_string()))?;

        result.into_iter().map(parse_membership).collect()
    }
}

fn parse_membership(value: Value) -> Result<Membership, MembershipError> {
    serde_json::from_value(value)
        .map_err(|e| MembershipError::DatabaseError(format!("Failed to parse membership: {}", e)))
}

fn join_statuses(statuses: &[MembershipStatus]) -> String {
    statuses.iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
