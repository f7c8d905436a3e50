// libs/payment-cell/src/models.rs
use serde::{Deserialize, Serialize};

/// What the payment gateway needs to render a QR code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRequest {
    pub amount: i64,
    pub payer_name: String,
    pub payee_name: String,
}

/// Displayable payment payload returned by the gateway.
///
/// Completion is asserted by the payer in the UI; the gateway is not polled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentInitiation {
    pub qr_code_url: String,
    pub reference_number: String,
    pub upi_id: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InitiatePaymentRequest {
    pub amount: i64,
    pub payer_name: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment gateway is not configured")]
    NotConfigured,

    #[error("Invalid payment request: {0}")]
    InvalidRequest(String),

    #[error("Payment initiation failed: {0}")]
    InitiationFailed(String),
}

impl PaymentRequest {
    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.amount <= 0 {
            return Err(PaymentError::InvalidRequest(
                format!("amount must be positive, got {}", self.amount)
            ));
        }
        if self.payer_name.trim().is_empty() {
            return Err(PaymentError::InvalidRequest("payer name is required".to_string()));
        }
        Ok(())
    }
}
