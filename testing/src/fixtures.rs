//! Mock-server fixtures for the admin API.
//!
//! Protected endpoints are mounted at priority 1 and only match the expected
//! bearer token; [`mount_unauthorized`] mounts a priority-10 fallback for the
//! same route, so any other token (or none) gets a 401 envelope.

use lexis_admin_core::Session;
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Refresh endpoint path under the default configuration.
pub const REFRESH_PATH: &str = "/auth/refresh-token";

/// Build a session from literal tokens.
///
/// # Panics
///
/// Panics if either token is empty.
#[must_use]
#[allow(clippy::expect_used)]
pub fn session(access_token: &str, refresh_token: &str) -> Session {
    Session::new(access_token, refresh_token).expect("fixture tokens should be non-empty")
}

/// Success envelope around `data`.
#[must_use]
pub fn envelope(data: Value) -> Value {
    json!({ "data": data, "message": null })
}

/// Refresh endpoint success body carrying a new session.
#[must_use]
pub fn refresh_body(access_token: &str, refresh_token: &str) -> Value {
    envelope(json!({
        "session": {
            "accessToken": access_token,
            "refreshToken": refresh_token,
        }
    }))
}

/// Refresh endpoint that accepts `expected_refresh` and mints a new session.
pub async fn mount_refresh_success(
    server: &MockServer,
    expected_refresh: &str,
    access_token: &str,
    refresh_token: &str,
) {
    mount_refresh_success_delayed(
        server,
        expected_refresh,
        access_token,
        refresh_token,
        Duration::ZERO,
    )
    .await;
}

/// Like [`mount_refresh_success`], answering only after `delay`.
pub async fn mount_refresh_success_delayed(
    server: &MockServer,
    expected_refresh: &str,
    access_token: &str,
    refresh_token: &str,
    delay: Duration,
) {
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(body_json(json!({ "refreshToken": expected_refresh })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(refresh_body(access_token, refresh_token))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Refresh endpoint that always fails with `status`.
pub async fn mount_refresh_failure(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .respond_with(
            ResponseTemplate::new(status).set_body_json(json!({ "message": "Refresh failed" })),
        )
        .mount(server)
        .await;
}

/// Endpoint that answers `data` when called with `Bearer <token>`.
pub async fn mount_protected(
    server: &MockServer,
    http_method: &str,
    route: &str,
    token: &str,
    data: Value,
) {
    Mock::given(method(http_method))
        .and(path(route))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(data)))
        .with_priority(1)
        .mount(server)
        .await;
}

/// Fallback answering 401 for every call to `route` not matched elsewhere.
pub async fn mount_unauthorized(server: &MockServer, http_method: &str, route: &str) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Unauthorized" })))
        .with_priority(10)
        .mount(server)
        .await;
}

/// Requests the server received for `route`, in arrival order.
pub async fn requests_to(server: &MockServer, route: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == route)
        .collect()
}

/// Number of requests the server received for `route`.
pub async fn count_requests(server: &MockServer, route: &str) -> usize {
    requests_to(server, route).await.len()
}

/// Bearer token of each request to `route`; `None` where no bearer was sent.
pub async fn bearer_tokens(server: &MockServer, route: &str) -> Vec<Option<String>> {
    requests_to(server, route)
        .await
        .iter()
        .map(|request| {
            request
                .headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.strip_prefix("Bearer "))
                .map(str::to_owned)
        })
        .collect()
}
