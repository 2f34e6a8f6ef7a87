//! Request decoration, error mapping and envelope helpers.

#![allow(clippy::unwrap_used)]

use lexis_admin_client::{AdminClient, ApiRequest, ClientConfig};
use lexis_admin_core::RequestError;
use lexis_admin_testing::fixtures::{self, REFRESH_PATH};
use lexis_admin_testing::{RecordingCredentialStore, init_test_tracing};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn signed_in(server: &MockServer) -> AdminClient<RecordingCredentialStore> {
    init_test_tracing();
    AdminClient::new(
        ClientConfig::new(server.uri()),
        RecordingCredentialStore::with_session(fixtures::session("a1", "r1")),
    )
    .unwrap()
}

#[derive(Debug, Deserialize, PartialEq)]
struct Topic {
    id: u32,
    name: String,
}

#[tokio::test]
async fn attaches_bearer_and_accept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topics/7"))
        .and(header("authorization", "Bearer a1"))
        .and(header("accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fixtures::envelope(json!({ "id": 7, "name": "Grammar" }))),
        )
        .mount(&server)
        .await;

    let topic: Topic = signed_in(&server).get("/topics/7").await.unwrap();
    assert_eq!(
        topic,
        Topic {
            id: 7,
            name: "Grammar".into()
        }
    );
}

#[tokio::test]
async fn post_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/topics"))
        .and(body_json(json!({ "name": "Vocabulary" })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(fixtures::envelope(json!({ "id": 8, "name": "Vocabulary" }))),
        )
        .mount(&server)
        .await;

    let created: Topic = signed_in(&server)
        .post("/topics", &json!({ "name": "Vocabulary" }))
        .await
        .unwrap();
    assert_eq!(created.id, 8);
}

#[tokio::test]
async fn query_and_prefix_are_applied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/lessons"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::envelope(json!([]))))
        .mount(&server)
        .await;

    let client = AdminClient::new(
        ClientConfig::new(server.uri()).with_api_prefix("/api/v1/"),
        RecordingCredentialStore::with_session(fixtures::session("a1", "r1")),
    )
    .unwrap();

    let response = client
        .send(ApiRequest::get("lessons").query("page", 2))
        .await
        .unwrap();
    assert!(response.status().is_success());
    assert_eq!(client.base_url().path(), "/api/v1/");
}

#[tokio::test]
async fn non_401_errors_pass_through() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/topics/1"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })))
        .mount(&server)
        .await;
    fixtures::mount_refresh_success(&server, "r1", "new", "new-r").await;

    let client = signed_in(&server);
    let err = client.delete::<Value>("/topics/1").await.unwrap_err();

    assert_eq!(err, RequestError::http(500, "boom"));
    assert_eq!(fixtures::count_requests(&server, REFRESH_PATH).await, 0);
    assert_eq!(client.store().current(), Some(fixtures::session("a1", "r1")));
}

#[tokio::test]
async fn error_without_envelope_uses_body_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topics"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such route"))
        .mount(&server)
        .await;

    let err = signed_in(&server).get::<Value>("/topics").await.unwrap_err();
    assert_eq!(err, RequestError::http(404, "no such route"));
}

#[tokio::test]
async fn non_envelope_success_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topics"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain"))
        .mount(&server)
        .await;

    let err = signed_in(&server).get::<Value>("/topics").await.unwrap_err();
    assert!(matches!(err, RequestError::Decode(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topics"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(fixtures::envelope(json!([])))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = AdminClient::new(
        ClientConfig::new(server.uri()).with_request_timeout(Duration::from_millis(200)),
        RecordingCredentialStore::new(),
    )
    .unwrap();

    let err = client.get::<Value>("/topics").await.unwrap_err();
    assert_eq!(err, RequestError::Timeout);
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let client = AdminClient::new(
        ClientConfig::new(format!("http://127.0.0.1:{port}")),
        RecordingCredentialStore::with_session(fixtures::session("a1", "r1")),
    )
    .unwrap();

    let err = client.get::<Value>("/topics").await.unwrap_err();
    assert!(matches!(err, RequestError::Network(_)), "unexpected error: {err}");
    assert_eq!(client.store().clear_count(), 0);
}

#[tokio::test]
async fn sign_out_drops_the_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::envelope(json!(null))))
        .mount(&server)
        .await;

    let client = signed_in(&server);
    client.sign_out();
    client.get::<Value>("/me").await.unwrap();

    client.establish_session(fixtures::session("a9", "r9"));
    client.get::<Value>("/me").await.unwrap();

    assert_eq!(
        fixtures::bearer_tokens(&server, "/me").await,
        vec![None, Some("a9".to_string())]
    );
}

#[tokio::test]
async fn retried_request_is_never_refreshed() {
    let server = MockServer::start().await;
    fixtures::mount_unauthorized(&server, "GET", "/topics").await;
    fixtures::mount_refresh_success(&server, "r1", "new", "new-r").await;

    let client = signed_in(&server);
    let err = client
        .send(ApiRequest::get("/topics").mark_retried())
        .await
        .unwrap_err();

    assert_eq!(err, RequestError::http(401, "Unauthorized"));
    assert_eq!(fixtures::count_requests(&server, REFRESH_PATH).await, 0);
    assert_eq!(client.store().current(), Some(fixtures::session("a1", "r1")));
    assert_eq!(client.store().clear_count(), 0);
}
