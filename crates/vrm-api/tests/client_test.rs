#![allow(clippy::unwrap_used)]
// Integration tests for `VrmClient` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vrm_api::{AuthStrategy, ClientConfig, Error, RetryPolicy, TokenType, VrmClient};

// ── Helpers ─────────────────────────────────────────────────────────

/// Two retries with millisecond delays so failure paths stay fast.
fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}

async fn token_client(token_type: TokenType) -> (MockServer, VrmClient) {
    let server = MockServer::start().await;
    let client = VrmClient::new(
        ClientConfig::with_token("test-token", token_type)
            .base_url(server.uri())
            .retry_policy(fast_retry()),
    )
    .unwrap();
    (server, client)
}

async fn password_client() -> (MockServer, VrmClient) {
    let server = MockServer::start().await;
    let client = VrmClient::new(
        ClientConfig::with_password("user@example.com", "hunter2", None)
            .base_url(server.uri())
            .retry_policy(fast_retry()),
    )
    .unwrap();
    (server, client)
}

async fn mount_login(server: &MockServer, token: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": token, "idUser": 7 }))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn devices_body() -> serde_json::Value {
    json!({
        "success": true,
        "records": [
            { "id": 11, "name": "MultiPlus-II", "deviceType": "inverter" },
            { "idDevice": 12, "name": "SmartSolar" }
        ]
    })
}

// ── Authentication header tests ─────────────────────────────────────

#[tokio::test]
async fn test_bearer_token_header() {
    let (server, client) = token_client(TokenType::Bearer).await;
    assert_eq!(client.auth_strategy(), AuthStrategy::BearerToken);

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .and(header("X-Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_body()))
        .expect(1)
        .mount(&server)
        .await;

    let devices = client.get_devices(42).await.unwrap();
    assert_eq!(devices.total(), 2);
}

#[tokio::test]
async fn test_access_token_header() {
    let (server, client) = token_client(TokenType::Token).await;
    assert_eq!(client.auth_strategy(), AuthStrategy::AccessToken);

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .and(header("X-Authorization", "Token test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_body()))
        .expect(1)
        .mount(&server)
        .await;

    client.get_devices(42).await.unwrap();
}

#[tokio::test]
async fn test_password_session_logs_in_once() {
    let (server, client) = password_client().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({
            "username": "user@example.com",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "session-token",
            "idUser": 7
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .and(header("X-Authorization", "Bearer session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_body()))
        .expect(2)
        .mount(&server)
        .await;

    client.get_devices(42).await.unwrap();
    client.get_devices(42).await.unwrap();
}

#[tokio::test]
async fn test_expired_session_logs_in_again() {
    let (server, client) = password_client().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "short-lived",
            "idUser": 7,
            "expires": 1
        })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .and(header("X-Authorization", "Bearer short-lived"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_body()))
        .expect(2)
        .mount(&server)
        .await;

    client.get_devices(42).await.unwrap();
    client.get_devices(42).await.unwrap();
}

#[tokio::test]
async fn test_login_honours_request_timeout() {
    let server = MockServer::start().await;
    let client = VrmClient::new(
        ClientConfig::with_password("user@example.com", "hunter2", None)
            .base_url(server.uri())
            .request_timeout(Duration::from_millis(200))
            .http_client(reqwest::Client::new()),
    )
    .unwrap();

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": "late" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let started = std::time::Instant::now();
    let err = client.get_devices(42).await.unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }), "got: {err:?}");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_login_sends_client_id() {
    let server = MockServer::start().await;
    let client = VrmClient::new(
        ClientConfig::with_password("user@example.com", "hunter2", Some("my-app".into()))
            .base_url(server.uri()),
    )
    .unwrap();

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({
            "username": "user@example.com",
            "password": "hunter2",
            "client_id": "my-app"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "s" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/installations/1/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": [] })))
        .mount(&server)
        .await;

    client.get_devices(1).await.unwrap();
}

#[tokio::test]
async fn test_concurrent_requests_share_one_login() {
    let (server, client) = password_client().await;
    mount_login(&server, "shared-token", 1).await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .and(header("X-Authorization", "Bearer shared-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_body()))
        .expect(5)
        .mount(&server)
        .await;

    let results = futures::future::join_all((0..5).map(|_| client.get_devices(42))).await;
    for result in results {
        assert_eq!(result.unwrap().total(), 2);
    }
}

#[tokio::test]
async fn test_login_failure() {
    let (server, client) = password_client().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "errors": "Invalid credentials"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.get_devices(42).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_without_token_fails() {
    let (server, client) = password_client().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "idUser": 7 })))
        .mount(&server)
        .await;

    let result = client.get_devices(42).await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
}

#[tokio::test]
async fn test_rejected_session_is_refreshed_once() {
    let (server, client) = password_client().await;
    mount_login(&server, "session-token", 2).await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_body()))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.get_devices(42).await.unwrap().total(), 2);
}

#[tokio::test]
async fn test_persistent_401_surfaces_after_one_refresh() {
    let (server, client) = password_client().await;
    mount_login(&server, "session-token", 2).await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
        .expect(2)
        .mount(&server)
        .await;

    let result = client.get_devices(42).await;
    assert!(matches!(result, Err(Error::Request { status: 401, .. })));
}

#[tokio::test]
async fn test_token_401_is_not_retried() {
    let (server, client) = token_client(TokenType::Bearer).await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.get_devices(42).await.unwrap_err();
    assert!(err.is_auth_expired());
}

// ── Retry tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_503_is_retried_until_exhausted() {
    let (server, client) = token_client(TokenType::Bearer).await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(3)
        .mount(&server)
        .await;

    let result = client.get_devices(42).await;
    match result {
        Err(Error::Request { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("expected Request error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_transient_failure_then_success() {
    let (server, client) = token_client(TokenType::Bearer).await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_body()))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.get_devices(42).await.unwrap().total(), 2);
}

#[tokio::test]
async fn test_429_is_retried() {
    let (server, client) = token_client(TokenType::Bearer).await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_body()))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.get_devices(42).await.unwrap().total(), 2);
}

#[tokio::test]
async fn test_404_is_not_retried() {
    let (server, client) = token_client(TokenType::Bearer).await;

    Mock::given(method("GET"))
        .and(path("/installations/999/devices"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.get_devices(999).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_retries_disabled() {
    let server = MockServer::start().await;
    let client = VrmClient::new(
        ClientConfig::with_token("t", TokenType::Bearer)
            .base_url(server.uri())
            .max_retries(0),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.get_devices(42).await;
    assert!(matches!(result, Err(Error::Request { status: 500, .. })));
}

#[tokio::test]
async fn test_unreachable_host_reports_attempts() {
    let client = VrmClient::new(
        ClientConfig::with_token("t", TokenType::Bearer)
            .base_url("http://127.0.0.1:1/")
            .retry_policy(fast_retry()),
    )
    .unwrap();

    match client.get_devices(1).await {
        Err(Error::Connection { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("expected Connection error, got: {other:?}"),
    }
}

// ── Envelope tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_success_false_is_request_error() {
    let (server, client) = token_client(TokenType::Bearer).await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "errors": "Site not accessible"
        })))
        .expect(1)
        .mount(&server)
        .await;

    match client.get_devices(42).await {
        Err(Error::Request { status, body }) => {
            assert_eq!(status, 200);
            assert!(body.contains("Site not accessible"));
        }
        other => panic!("expected Request error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_schema_mismatch_names_field() {
    let (server, client) = token_client(TokenType::Bearer).await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [{ "id": 1, "name": "ok" }, { "id": 2 }]
        })))
        .mount(&server)
        .await;

    match client.get_devices(42).await {
        Err(Error::Parse { field, .. }) => assert_eq!(field, "records[1].name"),
        other => panic!("expected Parse error, got: {other:?}"),
    }
}

// ── Resource tests ──────────────────────────────────────────────────

#[tokio::test]
async fn test_get_me() {
    let (server, client) = token_client(TokenType::Bearer).await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "user": { "id": 7, "name": "Jo", "email": "jo@example.com", "country": "NL" }
        })))
        .mount(&server)
        .await;

    let me = client.get_me().await.unwrap();
    assert_eq!(me.id, 7);
    assert_eq!(me.email.as_deref(), Some("jo@example.com"));
    assert_eq!(me.extra.get("country"), Some(&json!("NL")));
}

#[tokio::test]
async fn test_get_sites_with_token_resolves_user() {
    let (server, client) = token_client(TokenType::Bearer).await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": 7 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/7/installations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "records": [
                { "idSite": 1, "name": "Home", "identifier": "c0619ab0a1b2" },
                { "idSite": 2, "name": "Boat", "accessLevel": 1 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sites = client.get_sites().await.unwrap();
    assert_eq!(sites.total(), 2);
    assert_eq!(sites.records()[0].identifier.as_deref(), Some("c0619ab0a1b2"));
    assert_eq!(sites.records()[1].access_level, Some(1));
}

#[tokio::test]
async fn test_get_sites_with_session_uses_login_user() {
    let (server, client) = password_client().await;
    mount_login(&server, "session-token", 1).await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/7/installations"))
        .and(header("X-Authorization", "Bearer session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let sites = client.get_sites().await.unwrap();
    assert!(sites.is_empty());
    assert_eq!(sites.total(), 0);
}

#[tokio::test]
async fn test_get_devices_tags_site() {
    let (server, client) = token_client(TokenType::Bearer).await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_body()))
        .mount(&server)
        .await;

    let devices = client.get_devices(42).await.unwrap();
    let ids: Vec<i64> = devices.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![11, 12]);
    assert!(devices.iter().all(|d| d.site_id == 42));
}

#[tokio::test]
async fn test_get_measurements_with_range() {
    let (server, client) = token_client(TokenType::Bearer).await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices/11/measurements"))
        .and(query_param("start", "1704067200"))
        .and(query_param("end", "1704153600"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [
                { "type": "voltage", "value": 52.1, "unit": "V", "timestamp": 1_704_067_260 },
                { "type": "soc", "value": 80, "timestamp": 1_704_067_260 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let start = chrono::DateTime::from_timestamp(1_704_067_200, 0);
    let end = chrono::DateTime::from_timestamp(1_704_153_600, 0);
    let measurements = client.get_measurements(42, 11, start, end).await.unwrap();

    assert_eq!(measurements.total(), 2);
    assert_eq!(measurements.records()[0].unit.as_deref(), Some("V"));
    assert_eq!(measurements.records()[1].unit, None);
}

#[tokio::test]
async fn test_get_latest_measurement() {
    let (server, client) = token_client(TokenType::Bearer).await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices/11/measurements"))
        .and(query_param("type", "soc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [
                { "type": "soc", "value": 70, "timestamp": 100 },
                { "type": "soc", "value": 85, "timestamp": 300 },
                { "type": "soc", "value": 75, "timestamp": 200 }
            ]
        })))
        .mount(&server)
        .await;

    let latest = client.get_latest_measurement(42, 11, "soc").await.unwrap().unwrap();
    assert!((latest.value - 85.0).abs() < f64::EPSILON);
    assert_eq!(latest.timestamp.timestamp(), 300);
}

#[tokio::test]
async fn test_get_latest_measurement_none() {
    let (server, client) = token_client(TokenType::Bearer).await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices/11/measurements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "records": [] })))
        .mount(&server)
        .await;

    let latest = client.get_latest_measurement(42, 11, "soc").await.unwrap();
    assert!(latest.is_none());
}

#[tokio::test]
async fn test_get_system_overview() {
    let (server, client) = token_client(TokenType::Bearer).await;

    Mock::given(method("GET"))
        .and(path("/installations/42/system-overview"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "records": {
                "devices": [
                    {
                        "name": "Gateway",
                        "productName": "Cerbo GX",
                        "firmwareVersion": "v3.14",
                        "lastConnection": 1_700_000_000,
                        "class": "device-class-gateway"
                    },
                    { "name": "Battery Monitor", "instance": 279 }
                ]
            }
        })))
        .mount(&server)
        .await;

    let overview = client.get_system_overview(42).await.unwrap();
    assert_eq!(overview.total(), 2);
    let gateway = &overview.records()[0];
    assert_eq!(gateway.product_name.as_deref(), Some("Cerbo GX"));
    assert_eq!(gateway.last_connection.map(|t| t.timestamp()), Some(1_700_000_000));
    assert_eq!(overview.records()[1].instance, Some(279));
}

#[tokio::test]
async fn test_get_alarms() {
    let (server, client) = token_client(TokenType::Bearer).await;

    Mock::given(method("GET"))
        .and(path("/installations/42/alarms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "alarms": [{
                "idDataAttribute": 143,
                "instance": 0,
                "lowAlarm": 11.5,
                "highAlarm": 15.0,
                "notifyAfterSeconds": 60
            }],
            "devices": [{ "idDeviceType": 1, "name": "Gateway" }],
            "users": [],
            "attributes": [{ "idDataAttribute": 143, "code": "bv" }]
        })))
        .mount(&server)
        .await;

    let report = client.get_alarms(42).await.unwrap();
    assert_eq!(report.total(), 1);
    assert_eq!(report.alarms()[0].data_attribute_id, 143);
    assert_eq!(report.alarms()[0].low_alarm, Some(11.5));
    assert_eq!(report.devices().len(), 1);
    assert!(report.users().is_empty());
    assert_eq!(report.attributes().len(), 1);
}

#[tokio::test]
async fn test_get_diagnostics() {
    let (server, client) = token_client(TokenType::Bearer).await;

    Mock::given(method("GET"))
        .and(path("/installations/42/diagnostics"))
        .and(query_param("count", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "num_records": 250,
            "records": [
                {
                    "idDataAttribute": 1,
                    "description": "Battery voltage",
                    "formattedValue": "52.10 V",
                    "code": "bv",
                    "Device": "Battery Monitor",
                    "timestamp": 1_700_000_000
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let diagnostics = client.get_diagnostics(42).await.unwrap();
    assert_eq!(diagnostics.total(), 1);
    let record = &diagnostics.records()[0];
    assert_eq!(record.formatted_value.as_deref(), Some("52.10 V"));
    assert_eq!(record.device.as_deref(), Some("Battery Monitor"));
}

// ── Demo and lifecycle tests ────────────────────────────────────────

#[tokio::test]
async fn test_demo_client_uses_demo_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/loginAsDemo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "demo-token" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .and(header("X-Authorization", "Bearer demo-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = VrmClient::demo(ClientConfig::default().base_url(server.uri()))
        .await
        .unwrap();
    assert_eq!(client.auth_strategy(), AuthStrategy::BearerToken);
    client.get_devices(42).await.unwrap();
}

#[tokio::test]
async fn test_demo_rejects_credentials() {
    let result = VrmClient::demo(ClientConfig::with_token("t", TokenType::Bearer)).await;
    assert!(matches!(result, Err(Error::Configuration { .. })));
}

#[tokio::test]
async fn test_demo_rejects_zero_timeout_before_any_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/loginAsDemo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "demo-token" })))
        .expect(0)
        .mount(&server)
        .await;

    let result = VrmClient::demo(
        ClientConfig::default()
            .base_url(server.uri())
            .request_timeout(Duration::ZERO),
    )
    .await;
    assert!(matches!(result, Err(Error::Configuration { .. })));
}

#[tokio::test]
async fn test_demo_token_request_honours_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/loginAsDemo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": "demo-token" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let started = std::time::Instant::now();
    let result = vrm_api::fetch_demo_token(
        &reqwest::Client::new(),
        &server.uri(),
        Duration::from_millis(200),
    )
    .await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_demo_login_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/loginAsDemo"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result =
        vrm_api::fetch_demo_token(&reqwest::Client::new(), &server.uri(), Duration::from_secs(5))
            .await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
}

#[tokio::test]
async fn test_close_logs_out_session() {
    let (server, client) = password_client().await;
    mount_login(&server, "session-token", 1).await;

    Mock::given(method("GET"))
        .and(path("/installations/42/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(devices_body()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/logout"))
        .and(header("X-Authorization", "Bearer session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    client.get_devices(42).await.unwrap();
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_close_without_session_is_silent() {
    let (server, client) = token_client(TokenType::Bearer).await;

    Mock::given(method("GET"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    client.close().await.unwrap();
}
