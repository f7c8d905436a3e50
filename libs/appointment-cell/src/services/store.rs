// libs/appointment-cell/src/services/store.rs
use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use shared_database::supabase::SupabaseClient;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, CancellationMetadata, DoctorProfile, RecordKind,
};

/// Data access for the `appointments` table and the doctor fee lookup.
pub struct AppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl AppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn insert(&self, record: Value, auth_token: &str) -> Result<Appointment, AppointmentError> {
        let result = self.supabase.request_returning(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            record,
        ).await.map_err(|e| {
            error!("Failed to insert appointment: {}", e);
            AppointmentError::DatabaseError(e.to_string())
        })?;

        result.into_iter()
            .next()
            .ok_or_else(|| AppointmentError::DatabaseError("Failed to create appointment".to_string()))
            .and_then(parse_appointment)
    }

    pub async fn get(&self, appointment_id: Uuid, auth_token: &str) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        self.fetch_many(&path, auth_token).await?
            .into_iter()
            .next()
            .ok_or(AppointmentError::NotFound)
    }

    /// A patient's bookings, newest slot first. Membership artifacts are never returned.
    pub async fn list_for_user(&self, user_id: Uuid, auth_token: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?user_id=eq.{}&record_kind=eq.{}&order=scheduled_at.desc",
            user_id,
            RecordKind::Booking,
        );

        self.fetch_many(&path, auth_token).await
    }

    pub async fn list_all(
        &self,
        status: Option<AppointmentStatus>,
        include_membership_purchases: bool,
        limit: Option<i32>,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut query_parts = Vec::new();
        if !include_membership_purchases {
            query_parts.push(format!("record_kind=eq.{}", RecordKind::Booking));
        }
        if let Some(status) = status {
            query_parts.push(format!("status=eq.{}", status));
        }
        query_parts.push("order=created_at.desc".to_string());
        query_parts.push(format!("limit={}", limit.unwrap_or(100)));

        let path = format!("/rest/v1/appointments?{}", query_parts.join("&"));
        self.fetch_many(&path, auth_token).await
    }

    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        cancellation: Option<CancellationMetadata>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Setting appointment {} to {}", appointment_id, status);

        let mut update = json!({
            "status": status,
            "updated_at": Utc::now().to_rfc3339()
        });
        if let Some(cancellation) = cancellation {
            update["cancellation"] = json!(cancellation);
        }

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result = self.supabase.request_returning(
            Method::PATCH,
            &path,
            Some(auth_token),
            update,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .next()
            .ok_or(AppointmentError::NotFound)
            .and_then(parse_appointment)
    }

    /// Bookings of the user that hold one unit of membership quota.
    ///
    /// Counted across the user's whole history, not per membership window, so
    /// a renewed membership starts with earlier free bookings already used.
    pub async fn count_free_bookings(&self, user_id: Uuid, auth_token: &str) -> Result<i64, AppointmentError> {
        let statuses = AppointmentStatus::QUOTA_COUNTED
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let path = format!(
            "/rest/v1/appointments?user_id=eq.{}&record_kind=eq.{}&is_free_appointment=eq.true&status=in.({})&select=id",
            user_id,
            RecordKind::Booking,
            statuses,
        );

        let count = self.supabase.count(&path, Some(auth_token)).await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        debug!("User {} has {} free bookings counted against quota", user_id, count);
        i64::try_from(count).map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    pub async fn get_doctor(&self, doctor_id: Uuid, auth_token: &str) -> Result<DoctorProfile, AppointmentError> {
        let path = format!(
            "/rest/v1/doctors?id=eq.{}&select=id,full_name,consultation_fee",
            doctor_id
        );

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        let row = result.into_iter().next().ok_or(AppointmentError::DoctorNotFound)?;
        serde_json::from_value(row)
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse doctor: {}", e)))
    }

    async fn fetch_many(&self, path: &str, auth_token: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            path,
            Some(auth_token),
            None,
        ).await.map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result.into_iter().map(parse_appointment).collect()
    }
}

fn parse_appointment(value: Value) -> Result<Appointment, AppointmentError> {
    serde_json::from_value(value)
        .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
}
