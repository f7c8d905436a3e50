// libs/payment-cell/src/services/gateway.rs
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info};

use shared_config::AppConfig;

use crate::models::{PaymentError, PaymentInitiation, PaymentRequest};

/// External payment initiation collaborator.
#[async_trait]
pub trait PaymentInitiator: Send + Sync {
    async fn initiate(&self, request: PaymentRequest) -> Result<PaymentInitiation, PaymentError>;
}

/// HTTP client for the UPI QR payment gateway.
pub struct PaymentGatewayClient {
    client: Client,
    base_url: String,
    api_key: String,
    configured: bool,
}

impl PaymentGatewayClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.payment_gateway_url.trim_end_matches('/').to_string(),
            api_key: config.payment_gateway_api_key.clone(),
            configured: config.is_payment_gateway_configured(),
        }
    }
}

#[async_trait]
impl PaymentInitiator for PaymentGatewayClient {
    /// POST {gateway}/payments/qr
    async fn initiate(&self, request: PaymentRequest) -> Result<PaymentInitiation, PaymentError> {
        if !self.configured {
            return Err(PaymentError::NotConfigured);
        }
        request.validate()?;

        info!("Initiating payment of {} for {}", request.amount, request.payer_name);

        let url = format!("{}/payments/qr", self.base_url);
        debug!("Sending payment initiation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| PaymentError::InitiationFailed(e.to_string()))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| PaymentError::InitiationFailed(e.to_string()))?;

        if !status.is_success() {
            error!("Payment initiation failed: {} - {}", status, response_text);
            return Err(PaymentError::InitiationFailed(
                format!("HTTP {}: {}", status, response_text)
            ));
        }

        let initiation: PaymentInitiation = serde_json::from_str(&response_text)
            .map_err(|e| PaymentError::InitiationFailed(
                format!("Failed to parse gateway response: {}", e)
            ))?;

        info!("Payment initiated with reference {}", initiation.reference_number);
        Ok(initiation)
    }
}
