// libs/appointment-cell/src/services/management.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::AuthContext;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, CancellationMetadata, CancelledBy,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::store::AppointmentStore;

/// Patient views, patient cancellation and the staff status flow.
pub struct AppointmentManagementService {
    store: AppointmentStore,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentManagementService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: AppointmentStore::new(Arc::new(SupabaseClient::new(config))),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    pub async fn list_appointments(&self, ctx: &AuthContext) -> Result<Vec<Appointment>, AppointmentError> {
        let user_id = caller_id(ctx)?;
        self.store.list_for_user(user_id, ctx.token()).await
    }

    /// Owners see their bookings; staff additionally see membership artifacts.
    pub async fn get_appointment(&self, ctx: &AuthContext, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let appointment = self.store.get(appointment_id, ctx.token()).await?;

        if ctx.is_staff() {
            return Ok(appointment);
        }
        if appointment.is_membership_artifact() {
            return Err(AppointmentError::NotFound);
        }
        if !ctx.owns(appointment.user_id) {
            return Err(AppointmentError::Unauthorized("Not authorized to view this appointment".to_string()));
        }

        Ok(appointment)
    }

    /// Cancels the caller's own booking. A cancelled free booking stops counting against quota.
    pub async fn cancel_appointment(
        &self,
        ctx: &AuthContext,
        appointment_id: Uuid,
        reason: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.store.get(appointment_id, ctx.token()).await?;

        if appointment.is_membership_artifact() {
            return Err(AppointmentError::NotFound);
        }
        if !ctx.owns(appointment.user_id) {
            return Err(AppointmentError::Unauthorized("Not authorized to cancel this appointment".to_string()));
        }

        self.lifecycle.validate_patient_cancellation(appointment.status)?;

        let cancellation = CancellationMetadata {
            cancelled_by: CancelledBy::Patient,
            reason,
            cancelled_at: Utc::now(),
        };

        let cancelled = self.store
            .update_status(appointment_id, AppointmentStatus::Cancelled, Some(cancellation), ctx.token())
            .await?;

        info!(
            "Appointment {} cancelled by patient {} (was free: {})",
            appointment_id, ctx.user.id, appointment.is_free_appointment
        );
        Ok(cancelled)
    }

    pub async fn list_all_appointments(
        &self,
        ctx: &AuthContext,
        status: Option<AppointmentStatus>,
        include_membership_purchases: bool,
        limit: Option<i32>,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        require_staff(ctx)?;
        self.store.list_all(status, include_membership_purchases, limit, ctx.token()).await
    }

    /// Staff status change along the lifecycle table.
    pub async fn update_status(
        &self,
        ctx: &AuthContext,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        reason: Option<String>,
    ) -> Result<Appointment, AppointmentError> {
        require_staff(ctx)?;

        let appointment = self.store.get(appointment_id, ctx.token()).await?;
        if appointment.is_membership_artifact() {
            return Err(AppointmentError::ValidationError(
                "Membership purchases are managed through the membership endpoints".to_string()
            ));
        }

        self.lifecycle.validate_status_transition(appointment.status, new_status)?;

        let cancellation = (new_status == AppointmentStatus::Cancelled).then(|| CancellationMetadata {
            cancelled_by: CancelledBy::Admin,
            reason,
            cancelled_at: Utc::now(),
        });

        let updated = self.store
            .update_status(appointment_id, new_status, cancellation, ctx.token())
            .await?;

        info!(
            "Appointment {} moved {} -> {} by {}",
            appointment_id, appointment.status, new_status, ctx.user.id
        );
        Ok(updated)
    }
}

fn caller_id(ctx: &AuthContext) -> Result<Uuid, AppointmentError> {
    ctx.user_id().map_err(|e| AppointmentError::Unauthorized(e.to_string()))
}

fn require_staff(ctx: &AuthContext) -> Result<(), AppointmentError> {
    if ctx.is_staff() {
        Ok(())
    } else {
        Err(AppointmentError::Unauthorized("Staff access required".to_string()))
    }
}
