use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub payment_gateway_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            payment_gateway_url: "http://localhost:54322".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            payment_gateway_url: self.payment_gateway_url.clone(),
            payment_gateway_api_key: "test-gateway-key".to_string(),
            payment_payee_name: "ThankYouDoc".to_string(),
            clinic_timezone: "UTC".to_string(),
            port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn moderator(email: &str) -> Self {
        Self::new(email, "moderator")
    }

    pub fn uuid(&self) -> Uuid {
        Uuid::parse_str(&self.id).expect("test user ids are uuids")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    /// Signs a Supabase-shaped token: `role` is `authenticated`, the app role sits in `app_metadata`.
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": "authenticated",
            "app_metadata": { "role": user.role },
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// PostgREST-shaped rows for wiremock responses.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn member_details() -> serde_json::Value {
        json!({
            "full_name": "Test Patient",
            "phone": "9876543210",
            "email": "patient@example.com",
            "age": 32,
            "gender": "female"
        })
    }

    pub fn membership_response(
        membership_id: Uuid,
        user_id: &str,
        status: &str,
        valid_until: DateTime<Utc>,
    ) -> serde_json::Value {
        json!({
            "id": membership_id,
            "user_id": user_id,
            "status": status,
            "valid_from": (valid_until - Duration::days(182)).to_rfc3339(),
            "valid_until": valid_until.to_rfc3339(),
            "quota": 4,
            "amount": 3500,
            "payment_reference": "UPI-REF-1",
            "member_details": Self::member_details(),
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn booking_response(
        appointment_id: Uuid,
        user_id: &str,
        doctor_id: &str,
        status: &str,
        payment_method: &str,
        is_free: bool,
    ) -> serde_json::Value {
        let payment_reference = match payment_method {
            "pay_at_clinic" => "PAY_AT_CLINIC",
            "membership_free" => "MEMBERSHIP_FREE",
            _ => "UPI-REF-1",
        };

        json!({
            "id": appointment_id,
            "user_id": user_id,
            "doctor_id": doctor_id,
            "scheduled_at": "2024-01-20T10:00:00Z",
            "status": status,
            "record_kind": "booking",
            "is_free_appointment": is_free,
            "payment_method": payment_method,
            "payment_reference": payment_reference,
            "membership_id": null,
            "metadata": {
                "kind": "booking",
                "consultation_type": "offline",
                "payment_method": payment_method,
                "payment_reference": payment_reference,
                "is_free_appointment": is_free,
                "patient": {
                    "full_name": "Test Patient",
                    "phone": "9876543210",
                    "email": null,
                    "age": 32,
                    "gender": null,
                    "symptoms": "fever"
                }
            },
            "cancellation": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn membership_artifact_response(
        appointment_id: Uuid,
        user_id: &str,
        membership_id: Uuid,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": appointment_id,
            "user_id": user_id,
            "doctor_id": null,
            "scheduled_at": "2024-01-01T00:00:00Z",
            "status": status,
            "record_kind": "membership_purchase",
            "is_free_appointment": false,
            "payment_method": null,
            "payment_reference": "UPI-REF-1",
            "membership_id": membership_id,
            "metadata": {
                "kind": "membership_purchase",
                "membership_id": membership_id,
                "member_details": Self::member_details(),
                "amount": 3500
            },
            "cancellation": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn doctor_response(doctor_id: &str, full_name: &str, consultation_fee: f64) -> serde_json::Value {
        json!({
            "id": doctor_id,
            "full_name": full_name,
            "specialty": "General Physician",
            "consultation_fee": consultation_fee
        })
    }

    pub fn payment_qr_response(reference: &str, amount: i64) -> serde_json::Value {
        json!({
            "qr_code_url": format!("https://pay.example.com/qr/{}.png", reference),
            "reference_number": reference,
            "upi_id": "thankyoudoc@upi",
            "amount": amount
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_anon_key, "test-anon-key");
        assert!(!app_config.supabase_jwt_secret.is_empty());
        assert!(app_config.is_payment_gateway_configured());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::moderator("mod@example.com");
        assert_eq!(user.role, "moderator");

        let user_model = user.to_user();
        assert_eq!(user_model.role, Some(user.role.clone()));
        assert_eq!(user_model.id, user.id);
        assert_eq!(user.uuid().to_string(), user.id);
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let token = JwtTestUtils::create_test_token(&user, "test-secret", Some(1));

        assert_eq!(token.split('.').count(), 3);
    }
}
