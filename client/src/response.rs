//! Buffered admin API response.

use crate::error::transport_error;
use bytes::Bytes;
use lexis_admin_core::envelope::error_message;
use lexis_admin_core::{ApiEnvelope, RequestError};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

/// A fully-read response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ApiResponse {
    /// Build a response from parts.
    #[must_use]
    pub const fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Read a `reqwest` response to completion.
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self, RequestError> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(&e))?;

        Ok(Self::new(status, headers, body))
    }

    /// Turn a non-2xx response into `RequestError::Http`.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::Http` carrying the envelope message, or the raw
    /// body when the server sent none.
    pub fn error_for_status(self) -> Result<Self, RequestError> {
        if self.status.is_success() {
            return Ok(self);
        }

        let message = error_message(&self.body).unwrap_or_else(|| {
            let text = String::from_utf8_lossy(&self.body).trim().to_string();
            if text.is_empty() {
                self.status
                    .canonical_reason()
                    .unwrap_or("Unknown status")
                    .to_string()
            } else {
                text
            }
        });

        Err(RequestError::http(self.status.as_u16(), message))
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body.
    #[must_use]
    pub const fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, lossily decoded.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::Decode` if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        serde_json::from_slice(&self.body).map_err(|e| RequestError::Decode(e.to_string()))
    }

    /// Decode the body as a `{ data, message }` envelope.
    ///
    /// # Errors
    ///
    /// Returns `RequestError::Decode` if the body is not a valid envelope of `T`.
    pub fn envelope<T: DeserializeOwned>(&self) -> Result<ApiEnvelope<T>, RequestError> {
        self.json()
    }
}
