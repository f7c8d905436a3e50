// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use payment_cell::models::{PaymentInitiation, PaymentRequest};
use payment_cell::services::{PaymentGatewayClient, PaymentInitiator};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::AuthContext;

use crate::models::{
    validate_patient_details, AppointmentError, AppointmentMetadata, AppointmentStatus,
    BookAppointmentRequest, BookingMetadata, BookingOutcome, PaymentMethod, QuotaStatus,
    RecordKind, RequestedPaymentMethod, SlotInfo, MEMBERSHIP_FREE_REFERENCE,
    PAY_AT_CLINIC_REFERENCE,
};
use crate::services::quota::QuotaEvaluator;
use crate::services::slots::SlotService;
use crate::services::store::AppointmentStore;

/// Payment decision for a single booking.
struct PaymentPlan {
    method: PaymentMethod,
    reference: String,
    is_free: bool,
    initiation: Option<PaymentInitiation>,
}

/// Decides how a booking is paid for and writes it.
pub struct AppointmentBookingService {
    store: AppointmentStore,
    quota: QuotaEvaluator,
    slots: SlotService,
    payments: Arc<dyn PaymentInitiator>,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_payment_initiator(config, Arc::new(PaymentGatewayClient::new(config)))
    }

    pub fn with_payment_initiator(config: &AppConfig, payments: Arc<dyn PaymentInitiator>) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));

        Self {
            store: AppointmentStore::new(Arc::clone(&supabase)),
            quota: QuotaEvaluator::new(supabase),
            slots: SlotService::from_config(config),
            payments,
        }
    }

    pub async fn evaluate_quota(&self, ctx: &AuthContext) -> Result<QuotaStatus, AppointmentError> {
        self.quota.evaluate_quota(ctx).await
    }

    pub fn available_slots(&self, date: NaiveDate, now: DateTime<Utc>) -> Vec<SlotInfo> {
        self.slots.available_slots(date, now)
    }

    pub async fn book_appointment(
        &self,
        ctx: &AuthContext,
        request: BookAppointmentRequest,
    ) -> Result<BookingOutcome, AppointmentError> {
        self.book_appointment_at(ctx, request, Utc::now()).await
    }

    /// Book a consultation for the caller.
    ///
    /// Remaining quota always wins over the requested payment method. The
    /// booking is not deduplicated: submitting the same request twice
    /// creates two rows.
    pub async fn book_appointment_at(
        &self,
        ctx: &AuthContext,
        request: BookAppointmentRequest,
        now: DateTime<Utc>,
    ) -> Result<BookingOutcome, AppointmentError> {
        let user_id = ctx.user_id()
            .map_err(|e| AppointmentError::Unauthorized(e.to_string()))?;
        info!("Booking requested by user {} with doctor {}", user_id, request.doctor_id);

        validate_patient_details(&request.patient_details)?;
        let scheduled_at = self.slots.resolve(request.date, &request.slot, now)?;

        let quota = self.quota.evaluate_quota_at(ctx, now).await?;
        let plan = self.plan_payment(ctx, &request, &quota).await?;
        let quota_applied = plan.is_free;

        let metadata = AppointmentMetadata::Booking(BookingMetadata {
            consultation_type: request.consultation_type,
            payment_method: plan.method,
            payment_reference: plan.reference.clone(),
            is_free_appointment: plan.is_free,
            patient: request.patient_details,
        });

        let record = json!({
            "user_id": user_id,
            "doctor_id": request.doctor_id,
            "scheduled_at": scheduled_at.to_rfc3339(),
            "status": AppointmentStatus::Pending,
            "record_kind": RecordKind::Booking,
            "is_free_appointment": plan.is_free,
            "payment_method": plan.method,
            "payment_reference": plan.reference,
            "membership_id": null,
            "metadata": metadata,
            "cancellation": null,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let appointment = match self.store.insert(record, ctx.token()).await {
            Ok(appointment) => appointment,
            Err(e) => {
                if let Some(initiation) = &plan.initiation {
                    // Payment was initiated but no booking exists; staff reconcile by reference.
                    error!(
                        "Booking insert failed after payment {} was initiated for user {}: {}",
                        initiation.reference_number, user_id, e
                    );
                }
                return Err(e);
            }
        };

        info!(
            "Appointment {} booked for user {} ({}, free: {})",
            appointment.id, user_id, plan.method, plan.is_free
        );

        Ok(BookingOutcome {
            appointment,
            payment: plan.initiation,
            quota_applied,
        })
    }

    async fn plan_payment(
        &self,
        ctx: &AuthContext,
        request: &BookAppointmentRequest,
        quota: &QuotaStatus,
    ) -> Result<PaymentPlan, AppointmentError> {
        if quota.remaining > 0 {
            debug!("Applying membership quota ({} remaining)", quota.remaining);
            return Ok(PaymentPlan {
                method: PaymentMethod::MembershipFree,
                reference: MEMBERSHIP_FREE_REFERENCE.to_string(),
                is_free: true,
                initiation: None,
            });
        }

        match request.payment_method {
            RequestedPaymentMethod::Online => {
                let initiation = self.initiate_online_payment(ctx, request.doctor_id, &request.patient_details.full_name).await?;
                Ok(PaymentPlan {
                    method: PaymentMethod::Online,
                    reference: initiation.reference_number.clone(),
                    is_free: false,
                    initiation: Some(initiation),
                })
            }
            RequestedPaymentMethod::PayAtClinic => Ok(PaymentPlan {
                method: PaymentMethod::PayAtClinic,
                reference: PAY_AT_CLINIC_REFERENCE.to_string(),
                is_free: false,
                initiation: None,
            }),
        }
    }

    async fn initiate_online_payment(
        &self,
        ctx: &AuthContext,
        doctor_id: Uuid,
        payer_name: &str,
    ) -> Result<PaymentInitiation, AppointmentError> {
        let doctor = self.store.get_doctor(doctor_id, ctx.token()).await?;

        let request = PaymentRequest {
            amount: doctor.fee_amount(),
            payer_name: payer_name.to_string(),
            payee_name: doctor.full_name.clone(),
        };

        self.payments.initiate(request).await.map_err(|e| {
            warn!("Online payment for doctor {} could not be initiated: {}", doctor_id, e);
            AppointmentError::PaymentInitiation(e.to_string())
        })
    }
}
