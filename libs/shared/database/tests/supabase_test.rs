use reqwest::Method;
use serde_json::{json, Value};
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, header, query_param};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

fn config_for(mock_server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: mock_server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        supabase_jwt_secret: "secret".to_string(),
        payment_gateway_url: String::new(),
        payment_gateway_api_key: String::new(),
        payment_payee_name: "ThankYouDoc".to_string(),
        clinic_timezone: "UTC".to_string(),
        port: 3000,
    }
}

#[tokio::test]
async fn test_request_sends_auth_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/memberships"))
        .and(header("apikey", "test-anon-key"))
        .and(header("authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = SupabaseClient::new(&config_for(&mock_server));
    let rows: Vec<Value> = client
        .request(Method::GET, "/rest/v1/memberships?user_id=eq.abc", Some("user-token"), None)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_request_returning_asks_for_representation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": "created" }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = SupabaseClient::new(&config_for(&mock_server));
    let rows = client
        .request_returning(Method::POST, "/rest/v1/appointments", Some("token"), json!({ "status": "pending" }))
        .await
        .unwrap();

    assert_eq!(rows[0]["id"], "created");
}

#[tokio::test]
async fn test_count_reads_content_range() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("is_free_appointment", "eq.true"))
        .and(header("prefer", "count=exact"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-range", "0-0/3")
                .set_body_json(json!([{ "id": "only-one-row-returned" }])),
        )
        .mount(&mock_server)
        .await;

    let client = SupabaseClient::new(&config_for(&mock_server));
    let count = client
        .count("/rest/v1/appointments?select=id&is_free_appointment=eq.true&limit=1", Some("token"))
        .await
        .unwrap();

    assert_eq!(count, 3);
}

#[tokio::test]
async fn test_count_falls_back_to_row_count() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }, { "id": 2 }])))
        .mount(&mock_server)
        .await;

    let client = SupabaseClient::new(&config_for(&mock_server));
    let count = client.count("/rest/v1/appointments?select=id", Some("token")).await.unwrap();

    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/memberships"))
        .respond_with(ResponseTemplate::new(403).set_body_string("permission denied"))
        .mount(&mock_server)
        .await;

    let client = SupabaseClient::new(&config_for(&mock_server));
    let result: anyhow::Result<Vec<Value>> = client
        .request(Method::GET, "/rest/v1/memberships", Some("token"), None)
        .await;

    let err = result.unwrap_err().to_string();
    assert!(err.contains("Authentication error"));
}
