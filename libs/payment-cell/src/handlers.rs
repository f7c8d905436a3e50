// libs/payment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{InitiatePaymentRequest, PaymentError, PaymentRequest};
use crate::services::{PaymentGatewayClient, PaymentInitiator};

pub fn map_payment_error(e: PaymentError) -> AppError {
    match e {
        PaymentError::InvalidRequest(msg) => AppError::ValidationError(msg),
        PaymentError::NotConfigured => AppError::ExternalService(e.to_string()),
        PaymentError::InitiationFailed(msg) => {
            AppError::ExternalService(format!("Payment initiation failed: {}", msg))
        },
    }
}

/// Returns a QR payload the client shows before asserting payment.
#[axum::debug_handler]
pub async fn initiate_payment(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<InitiatePaymentRequest>,
) -> Result<Json<Value>, AppError> {
    info!("User {} requested a payment QR for {}", user.id, request.amount);

    let gateway = PaymentGatewayClient::new(&state);
    let initiation = gateway
        .initiate(PaymentRequest {
            amount: request.amount,
            payer_name: request.payer_name,
            payee_name: state.payment_payee_name.clone(),
        })
        .await
        .map_err(map_payment_error)?;

    Ok(Json(json!({
        "success": true,
        "payment": initiation
    })))
}
