//! Outbound request descriptor and the bearer-credential decorator.
//!
//! An [`ApiRequest`] keeps everything needed to reissue a call after a token
//! refresh: method, path, query, headers and body. Replay clones it with only
//! the `Authorization` header replaced.

use bytes::Bytes;
use lexis_admin_core::{CredentialStore, RequestError};
use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

/// A replayable admin API request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Bytes>,
    retried: bool,
}

impl ApiRequest {
    /// Create a request for `path`, relative to the configured base URL.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            retried: false,
        }
    }

    /// `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST` request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT` request.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `PATCH` request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE` request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Set a header, replacing any previous value.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Serialize `body` as the JSON request body.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::InvalidRequest` if serialization fails.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self, RequestError> {
        let bytes =
            serde_json::to_vec(body).map_err(|e| RequestError::InvalidRequest(e.to_string()))?;
        Ok(self.body(bytes, HeaderValue::from_static("application/json")))
    }

    /// Set a raw body with its content type.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>, content_type: HeaderValue) -> Self {
        self.headers.insert(CONTENT_TYPE, content_type);
        self.body = Some(body.into());
        self
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Path relative to the base URL.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in insertion order.
    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Request body, if any.
    #[must_use]
    pub const fn body_bytes(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Bearer token currently attached, if any.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
    }

    /// Whether this request has already been replayed after a refresh.
    #[must_use]
    pub const fn is_retried(&self) -> bool {
        self.retried
    }

    /// Copy of this request carrying `token` as its bearer credential.
    #[must_use]
    pub fn with_bearer(&self, token: &str) -> Self {
        let mut replay = self.clone();
        replay.set_bearer(token);
        replay
    }

    /// Set the one-shot retry guard.
    ///
    /// A request carrying the guard that receives 401 is returned to the
    /// caller as is; it never starts or joins a refresh.
    #[must_use]
    pub fn mark_retried(mut self) -> Self {
        self.retried = true;
        self
    }

    fn set_bearer(&mut self, token: &str) {
        match HeaderValue::try_from(format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                self.headers.insert(AUTHORIZATION, value);
            }
            Err(_) => {
                // Unrepresentable token; the server will answer 401.
                tracing::debug!(path = %self.path, "access token is not a valid header value");
                self.headers.remove(AUTHORIZATION);
            }
        }
    }
}

/// Attach the store's current access token as a bearer credential.
///
/// Without a session the request is left unauthenticated. This step cannot fail.
pub fn authorize<S: CredentialStore + ?Sized>(request: &mut ApiRequest, store: &S) {
    if let Some(token) = store.access_token() {
        request.set_bearer(&token);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use lexis_admin_core::Session;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Slot(Mutex<Option<Session>>);

    impl CredentialStore for Slot {
        fn session(&self) -> Option<Session> {
            self.0.lock().clone()
        }
        fn update_session(&self, session: Session) {
            *self.0.lock() = Some(session);
        }
        fn clear_session(&self) {
            *self.0.lock() = None;
        }
    }

    #[test]
    fn authorize_attaches_current_token() {
        let store = Slot::default();
        store.update_session(Session::new("a1", "r1").unwrap());

        let mut request = ApiRequest::get("/topics");
        authorize(&mut request, &store);

        assert_eq!(request.bearer(), Some("a1"));
        assert!(request.headers().get(AUTHORIZATION).unwrap().is_sensitive());
    }

    #[test]
    fn authorize_without_session_leaves_request_untouched() {
        let store = Slot::default();

        let mut request = ApiRequest::get("/topics");
        authorize(&mut request, &store);

        assert_eq!(request.bearer(), None);
        assert!(request.headers().is_empty());
    }

    #[test]
    fn with_bearer_replaces_only_authorization() {
        let original = ApiRequest::post("/vocabulary")
            .query("lang", "en")
            .json(&serde_json::json!({ "word": "serendipity" }))
            .unwrap()
            .with_bearer("old");

        let replay = original.with_bearer("new");

        assert_eq!(original.bearer(), Some("old"));
        assert_eq!(replay.bearer(), Some("new"));
        assert_eq!(replay.method(), original.method());
        assert_eq!(replay.path(), original.path());
        assert_eq!(replay.query_pairs(), original.query_pairs());
        assert_eq!(replay.body_bytes(), original.body_bytes());
        assert_eq!(
            replay.headers().get(CONTENT_TYPE),
            original.headers().get(CONTENT_TYPE)
        );
    }

    #[test]
    fn retry_marker_is_one_way() {
        let request = ApiRequest::get("/grammar");
        assert!(!request.is_retried());

        let replay = request.with_bearer("t").mark_retried();
        assert!(replay.is_retried());
        assert!(replay.with_bearer("u").is_retried());
    }

    #[test]
    fn invalid_token_is_not_attached() {
        let request = ApiRequest::get("/users").with_bearer("bad\ntoken");
        assert_eq!(request.bearer(), None);
    }
}
