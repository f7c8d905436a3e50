// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::Utc;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AuthContext, User};
use shared_models::error::AppError;

use crate::models::{
    AdminAppointmentQuery, AppointmentError, BookAppointmentRequest, CancelAppointmentRequest,
    PaymentMethod, SlotQuery, UpdateStatusRequest,
};
use crate::services::{AppointmentBookingService, AppointmentManagementService};

pub fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound | AppointmentError::DoctorNotFound => AppError::NotFound(e.to_string()),
        AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
        AppointmentError::Unauthorized(msg) => AppError::Forbidden(msg),
        AppointmentError::InvalidStatusTransition { .. } => AppError::BadRequest(e.to_string()),
        AppointmentError::PaymentInitiation(msg) => {
            AppError::ExternalService(format!("Payment initiation failed: {}", msg))
        },
        AppointmentError::DatabaseError(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let booking_service = AppointmentBookingService::new(&state);
    let slots = booking_service.available_slots(query.date, Utc::now());

    Ok(Json(json!({
        "success": true,
        "date": query.date,
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn get_quota(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthContext::new(user, auth.token());
    let booking_service = AppointmentBookingService::new(&state);

    let quota = booking_service.evaluate_quota(&ctx).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "quota": quota
    })))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthContext::new(user, auth.token());
    let booking_service = AppointmentBookingService::new(&state);

    let outcome = booking_service.book_appointment(&ctx, request).await
        .map_err(map_appointment_error)?;

    let message = match outcome.appointment.payment_method {
        Some(PaymentMethod::MembershipFree) => "Appointment booked using your membership",
        Some(PaymentMethod::Online) => "Scan the QR code to complete payment",
        _ => "Appointment booked, pay at the clinic",
    };

    Ok(Json(json!({
        "success": true,
        "appointment": outcome.appointment,
        "payment": outcome.payment,
        "quota_applied": outcome.quota_applied,
        "message": message
    })))
}

// ==============================================================================
// PATIENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_my_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthContext::new(user, auth.token());
    let service = AppointmentManagementService::new(&state);

    let appointments = service.list_appointments(&ctx).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "total": appointments.len(),
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthContext::new(user, auth.token());
    let service = AppointmentManagementService::new(&state);

    let appointment = service.get_appointment(&ctx, appointment_id).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthContext::new(user, auth.token());
    let service = AppointmentManagementService::new(&state);

    let appointment = service.cancel_appointment(&ctx, appointment_id, request.reason).await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled successfully"
    })))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_all_appointments(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<AdminAppointmentQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthContext::new(user, auth.token());
    let service = AppointmentManagementService::new(&state);

    let appointments = service
        .list_all_appointments(&ctx, query.status, query.include_membership_purchases, query.limit)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "total": appointments.len(),
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let ctx = AuthContext::new(user, auth.token());
    let service = AppointmentManagementService::new(&state);

    let appointment = service
        .update_status(&ctx, appointment_id, request.status, request.reason)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment
    })))
}
