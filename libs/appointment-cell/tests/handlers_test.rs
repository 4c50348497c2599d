mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::{appointment_routes, provider_routes};
use appointment_cell::services::reference::is_valid_reference_number;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

use common::{appointment, mount_patient, mount_provider, EchoInsert};

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn missing_token_is_rejected_with_failure_envelope() {
    let config = TestConfig::default();
    let app = appointment_routes(config.to_arc());

    let request = Request::builder()
        .method("GET")
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Missing authorization header"));
}

#[tokio::test]
async fn patient_creates_appointment_and_receives_reference() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mocks(&server.uri(), "http://127.0.0.1:9");
    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

    mount_patient(&server, &user.id, Uuid::new_v4()).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(EchoInsert)
        .expect(1)
        .mount(&server)
        .await;

    let app = appointment_routes(config.to_arc());
    let request = post_json("/", &token, json!({
        "hospital_id": Uuid::new_v4(),
        "department_id": Uuid::new_v4(),
        "appointment_date": "2026-03-10",
        "start_time": "14:00"
    }));

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["appointment"]["status"], json!("pending"));
    assert!(is_valid_reference_number(body["reference_number"].as_str().unwrap()));
}

#[tokio::test]
async fn user_without_patient_profile_cannot_book() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mocks(&server.uri(), "http://127.0.0.1:9");
    let user = TestUser::patient("new@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(EchoInsert)
        .expect(0)
        .mount(&server)
        .await;

    let app = appointment_routes(config.to_arc());
    let request = post_json("/", &token, json!({
        "hospital_id": Uuid::new_v4(),
        "department_id": Uuid::new_v4(),
        "appointment_date": "2026-03-10",
        "start_time": "14:00"
    }));

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], json!("Patient profile not found"));
}

#[tokio::test]
async fn cancel_that_matches_nothing_returns_not_found() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mocks(&server.uri(), "http://127.0.0.1:9");
    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

    mount_patient(&server, &user.id, Uuid::new_v4()).await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let app = appointment_routes(config.to_arc());
    let uri = format!("/{}/cancel", Uuid::new_v4());
    let (status, body) = send(app, post_json(&uri, &token, json!({}))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn cancel_accepts_request_without_body() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mocks(&server.uri(), "http://127.0.0.1:9");
    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);
    let patient_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();

    mount_patient(&server, &user.id, patient_id).await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(body_partial_json(json!({ "status": "cancelled" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment(appointment_id, patient_id, Uuid::new_v4(), "cancelled")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let app = appointment_routes(config.to_arc());
    let request = Request::builder()
        .method("POST")
        .uri(format!("/{}/cancel", appointment_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["appointment"]["status"], json!("cancelled"));
}

#[tokio::test]
async fn provider_cannot_approve_other_hospitals_appointment() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mocks(&server.uri(), "http://127.0.0.1:9");
    let user = TestUser::provider("doc@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);
    let appointment_id = Uuid::new_v4();

    mount_provider(&server, &user.id, Uuid::new_v4(), Uuid::new_v4()).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment(appointment_id, Uuid::new_v4(), Uuid::new_v4(), "pending")
        ])))
        .mount(&server)
        .await;

    let app = provider_routes(config.to_arc());
    let uri = format!("/{}/approve", appointment_id);
    let (status, body) = send(app, post_json(&uri, &token, json!({}))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn provider_approval_of_reviewed_request_conflicts() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mocks(&server.uri(), "http://127.0.0.1:9");
    let user = TestUser::provider("doc@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);
    let hospital_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();

    mount_provider(&server, &user.id, Uuid::new_v4(), hospital_id).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment(appointment_id, Uuid::new_v4(), hospital_id, "rejected")
        ])))
        .mount(&server)
        .await;

    let app = provider_routes(config.to_arc());
    let uri = format!("/{}/approve", appointment_id);
    let (status, body) = send(app, post_json(&uri, &token, json!({}))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"],
        json!("Appointment cannot be modified in current status: rejected")
    );
}

#[tokio::test]
async fn non_provider_is_forbidden_from_portal() {
    let server = MockServer::start().await;
    let config = TestConfig::with_mocks(&server.uri(), "http://127.0.0.1:9");
    let user = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

    Mock::given(method("GET"))
        .and(path("/rest/v1/providers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let app = provider_routes(config.to_arc());
    let request = Request::builder()
        .method("GET")
        .uri("/")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
