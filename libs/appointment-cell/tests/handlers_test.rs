use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::{to_bytes, Body},
    extract::{Extension, Path, Query, State},
    http::{Request, StatusCode},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, query_param};

use appointment_cell::handlers::*;
use appointment_cell::models::{
    AdminAppointmentQuery, AppointmentStatus, CancelAppointmentRequest, UpdateStatusRequest,
};
use appointment_cell::router::appointment_routes;
use shared_config::AppConfig;
use shared_models::{auth::User, error::AppError};
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn create_auth_header(token: &str) -> TypedHeader<Authorization<Bearer>> {
    TypedHeader(Authorization::bearer(token).unwrap())
}

fn create_user_extension(user: &TestUser) -> Extension<User> {
    Extension(user.to_user())
}

async fn config_for(server: &MockServer) -> Arc<AppConfig> {
    let mut config = TestConfig::default().to_app_config();
    config.supabase_url = server.uri();
    Arc::new(config)
}

async fn mount_get(server: &MockServer, appointment_id: Uuid, row: Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(server)
        .await;
}

async fn patch_bodies(server: &MockServer) -> Vec<Value> {
    server.received_requests().await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.as_str() == "PATCH")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

// ==============================================================================
// PATIENT VIEWS
// ==============================================================================

#[tokio::test]
async fn test_patient_listing_only_requests_bookings() {
    let server = MockServer::start().await;
    let patient = TestUser::patient("patient@example.com");
    let doctor_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("user_id", format!("eq.{}", patient.id)))
        .and(query_param("record_kind", "eq.booking"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::booking_response(Uuid::new_v4(), &patient.id, &doctor_id, "pending", "pay_at_clinic", false)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let Json(body) = list_my_appointments(
        State(config_for(&server).await),
        create_auth_header("test-token"),
        create_user_extension(&patient),
    ).await.unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["total"], 1);
    assert_eq!(body["appointments"][0]["record_kind"], "booking");
}

#[tokio::test]
async fn test_membership_artifact_hidden_from_patient() {
    let server = MockServer::start().await;
    let patient = TestUser::patient("patient@example.com");
    let artifact_id = Uuid::new_v4();

    mount_get(
        &server,
        artifact_id,
        MockSupabaseResponses::membership_artifact_response(artifact_id, &patient.id, Uuid::new_v4(), "pending"),
    ).await;

    let result = get_appointment(
        State(config_for(&server).await),
        Path(artifact_id),
        create_auth_header("test-token"),
        create_user_extension(&patient),
    ).await;

    assert_matches!(result, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn test_other_patients_booking_is_forbidden() {
    let server = MockServer::start().await;
    let owner = TestUser::patient("owner@example.com");
    let stranger = TestUser::patient("stranger@example.com");
    let appointment_id = Uuid::new_v4();

    mount_get(
        &server,
        appointment_id,
        MockSupabaseResponses::booking_response(appointment_id, &owner.id, &Uuid::new_v4().to_string(), "pending", "online", false),
    ).await;

    let result = get_appointment(
        State(config_for(&server).await),
        Path(appointment_id),
        create_auth_header("test-token"),
        create_user_extension(&stranger),
    ).await;

    assert_matches!(result, Err(AppError::Forbidden(_)));
}

// ==============================================================================
// PATIENT CANCELLATION
// ==============================================================================

#[tokio::test]
async fn test_cancelling_free_booking_releases_quota() {
    let server = MockServer::start().await;
    let patient = TestUser::patient("patient@example.com");
    let appointment_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4().to_string();

    mount_get(
        &server,
        appointment_id,
        MockSupabaseResponses::booking_response(appointment_id, &patient.id, &doctor_id, "confirmed", "membership_free", true),
    ).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::booking_response(appointment_id, &patient.id, &doctor_id, "cancelled", "membership_free", true)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let Json(body) = cancel_appointment(
        State(config_for(&server).await),
        Path(appointment_id),
        create_auth_header("test-token"),
        create_user_extension(&patient),
        Json(CancelAppointmentRequest { reason: Some("Feeling better".to_string()) }),
    ).await.unwrap();

    assert_eq!(body["appointment"]["status"], "cancelled");

    let patches = patch_bodies(&server).await;
    assert_eq!(patches[0]["status"], "cancelled");
    assert_eq!(patches[0]["cancellation"]["cancelled_by"], "patient");
    assert_eq!(patches[0]["cancellation"]["reason"], "Feeling better");

    // Cancelled rows fall outside the statuses counted against quota
    assert!(!AppointmentStatus::Cancelled.counts_toward_quota());
}

#[tokio::test]
async fn test_cancel_completed_booking_rejected() {
    let server = MockServer::start().await;
    let patient = TestUser::patient("patient@example.com");
    let appointment_id = Uuid::new_v4();

    mount_get(
        &server,
        appointment_id,
        MockSupabaseResponses::booking_response(appointment_id, &patient.id, &Uuid::new_v4().to_string(), "completed", "pay_at_clinic", false),
    ).await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = cancel_appointment(
        State(config_for(&server).await),
        Path(appointment_id),
        create_auth_header("test-token"),
        create_user_extension(&patient),
        Json(CancelAppointmentRequest::default()),
    ).await;

    assert_matches!(result, Err(AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_cancel_missing_appointment() {
    let server = MockServer::start().await;
    let patient = TestUser::patient("patient@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = cancel_appointment(
        State(config_for(&server).await),
        Path(Uuid::new_v4()),
        create_auth_header("test-token"),
        create_user_extension(&patient),
        Json(CancelAppointmentRequest::default()),
    ).await;

    assert_matches!(result, Err(AppError::NotFound(_)));
}

// ==============================================================================
// STAFF FLOW
// ==============================================================================

#[tokio::test]
async fn test_admin_confirms_pending_booking() {
    let server = MockServer::start().await;
    let admin = TestUser::admin("admin@example.com");
    let patient = TestUser::patient("patient@example.com");
    let appointment_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4().to_string();

    mount_get(
        &server,
        appointment_id,
        MockSupabaseResponses::booking_response(appointment_id, &patient.id, &doctor_id, "pending", "online", false),
    ).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::booking_response(appointment_id, &patient.id, &doctor_id, "confirmed", "online", false)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let Json(body) = update_appointment_status(
        State(config_for(&server).await),
        Path(appointment_id),
        create_auth_header("test-token"),
        create_user_extension(&admin),
        Json(UpdateStatusRequest { status: AppointmentStatus::Confirmed, reason: None }),
    ).await.unwrap();

    assert_eq!(body["appointment"]["status"], "confirmed");

    let patches = patch_bodies(&server).await;
    assert!(patches[0].get("cancellation").is_none());
}

#[tokio::test]
async fn test_status_update_outside_lifecycle_rejected() {
    let server = MockServer::start().await;
    let moderator = TestUser::moderator("mod@example.com");
    let patient = TestUser::patient("patient@example.com");
    let appointment_id = Uuid::new_v4();

    mount_get(
        &server,
        appointment_id,
        MockSupabaseResponses::booking_response(appointment_id, &patient.id, &Uuid::new_v4().to_string(), "cancelled", "online", false),
    ).await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = update_appointment_status(
        State(config_for(&server).await),
        Path(appointment_id),
        create_auth_header("test-token"),
        create_user_extension(&moderator),
        Json(UpdateStatusRequest { status: AppointmentStatus::Confirmed, reason: None }),
    ).await;

    assert_matches!(result, Err(AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_patient_cannot_update_status() {
    let server = MockServer::start().await;
    let patient = TestUser::patient("patient@example.com");

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let result = update_appointment_status(
        State(config_for(&server).await),
        Path(Uuid::new_v4()),
        create_auth_header("test-token"),
        create_user_extension(&patient),
        Json(UpdateStatusRequest { status: AppointmentStatus::Confirmed, reason: None }),
    ).await;

    assert_matches!(result, Err(AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_staff_listing_includes_artifacts_on_request() {
    let server = MockServer::start().await;
    let moderator = TestUser::moderator("mod@example.com");
    let patient = TestUser::patient("patient@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::booking_response(Uuid::new_v4(), &patient.id, &Uuid::new_v4().to_string(), "pending", "online", false),
            MockSupabaseResponses::membership_artifact_response(Uuid::new_v4(), &patient.id, Uuid::new_v4(), "pending")
        ])))
        .mount(&server)
        .await;

    let query = AdminAppointmentQuery {
        status: None,
        include_membership_purchases: true,
        limit: Some(20),
    };

    let Json(body) = list_all_appointments(
        State(config_for(&server).await),
        Query(query),
        create_auth_header("test-token"),
        create_user_extension(&moderator),
    ).await.unwrap();

    assert_eq!(body["total"], 2);

    let requests = server.received_requests().await.unwrap_or_default();
    let query_string = requests[0].url.query().unwrap_or_default().to_string();
    assert!(!query_string.contains("record_kind"));
    assert!(query_string.contains("limit=20"));
}

// ==============================================================================
// ROUTES
// ==============================================================================

#[tokio::test]
async fn test_slots_route_lists_full_day() {
    let test_config = TestConfig::default();
    let patient = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &test_config.jwt_secret, Some(1));

    let response = appointment_routes(test_config.to_arc())
        .oneshot(
            Request::builder()
                .uri("/slots?date=2030-06-01")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let slots = body["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 26);
    assert_eq!(slots[0]["label"], "09:00");
    assert_eq!(slots[25]["label"], "21:30");
    assert!(slots.iter().all(|s| s["selectable"] == true));
}

#[tokio::test]
async fn test_quota_route_requires_token() {
    let response = appointment_routes(TestConfig::default().to_arc())
        .oneshot(
            Request::builder()
                .uri("/quota")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_quota_route_with_expired_token() {
    let test_config = TestConfig::default();
    let patient = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_expired_token(&patient, &test_config.jwt_secret);

    let response = appointment_routes(test_config.to_arc())
        .oneshot(
            Request::builder()
                .uri("/quota")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
