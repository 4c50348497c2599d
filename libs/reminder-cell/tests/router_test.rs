use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reminder_cell::router::reminder_routes;
use shared_utils::test_utils::{TestConfig, TEST_CRON_SECRET};

fn trigger(method: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri("/reminders");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

#[tokio::test]
async fn trigger_without_secret_is_rejected() {
    let app = reminder_routes(TestConfig::default().to_arc());

    let response = app.oneshot(trigger("POST", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn trigger_with_wrong_secret_is_rejected() {
    let app = reminder_routes(TestConfig::default().to_arc());

    let response = app.oneshot(trigger("GET", Some("not-the-secret"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["success"], json!(false));
}

#[tokio::test]
async fn truncated_secret_is_rejected() {
    let app = reminder_routes(TestConfig::default().to_arc());
    let truncated = &TEST_CRON_SECRET[..TEST_CRON_SECRET.len() - 1];

    let response = app.oneshot(trigger("POST", Some(truncated))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn empty_configured_secret_rejects_everything() {
    let mut config = TestConfig::default().to_app_config();
    config.cron_secret = String::new();
    let app = reminder_routes(std::sync::Arc::new(config));

    let response = app.oneshot(trigger("POST", Some(""))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn authorized_trigger_returns_sweep_summary() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(6)
        .mount(&server)
        .await;

    let config = TestConfig::with_mocks(&server.uri(), &server.uri());
    for verb in ["GET", "POST"] {
        let app = reminder_routes(config.to_arc());
        let response = app.oneshot(trigger(verb, Some(TEST_CRON_SECRET))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["success"], json!(true));
        for key in ["48h", "24h", "2h"] {
            assert_eq!(body["results"][key]["sent"], json!(0));
        }
        assert!(body["results"]["timestamp"].is_string());
    }
}
