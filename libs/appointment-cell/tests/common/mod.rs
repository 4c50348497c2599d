#![allow(dead_code)]

use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use shared_utils::test_utils::MockSupabaseResponses;

/// Echoes an inserted appointment back the way PostgREST does with
/// `Prefer: return=representation`, filling in server-side columns.
pub struct EchoInsert;

impl Respond for EchoInsert {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut row: Value = serde_json::from_slice(&request.body).expect("insert body is json");
        row["id"] = json!(Uuid::new_v4());
        row["updated_at"] = row["created_at"].clone();
        ResponseTemplate::new(201).set_body_json(json!([row]))
    }
}

pub fn appointment(id: Uuid, patient_id: Uuid, hospital_id: Uuid, status: &str) -> Value {
    MockSupabaseResponses::appointment_response(
        &id.to_string(),
        &patient_id.to_string(),
        &hospital_id.to_string(),
        status,
    )
}

pub fn with_status(mut row: Value, status: &str) -> Value {
    row["status"] = json!(status);
    row
}

pub async fn mount_patient(server: &MockServer, user_id: &str, patient_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("user_id", format!("eq.{}", user_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::patient_response(&patient_id.to_string(), user_id)
        ])))
        .mount(server)
        .await;
}

pub async fn mount_provider(server: &MockServer, user_id: &str, provider_id: Uuid, hospital_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/providers"))
        .and(query_param("user_id", format!("eq.{}", user_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::provider_response(
                &provider_id.to_string(),
                user_id,
                &hospital_id.to_string(),
            )
        ])))
        .mount(server)
        .await;
}
