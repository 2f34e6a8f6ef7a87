//! Backend response envelope and refresh endpoint payloads.

use crate::session::Session;
use serde::{Deserialize, Serialize};

/// Conventional `{ data, message }` wrapper around every backend response.
///
/// Unknown envelope fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Response payload
    pub data: T,
    /// Optional human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Wrap a payload without a message.
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self {
            data,
            message: None,
        }
    }

    /// Unwrap the payload.
    #[must_use]
    pub fn into_data(self) -> T {
        self.data
    }
}

/// Body of the refresh endpoint call: `{ "refreshToken": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// The session's refresh token
    pub refresh_token: String,
}

impl RefreshRequest {
    /// Create a refresh request body.
    #[must_use]
    pub fn new(refresh_token: impl Into<String>) -> Self {
        Self {
            refresh_token: refresh_token.into(),
        }
    }
}

/// `data` of a successful refresh response: `{ session: { accessToken, refreshToken } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    /// Newly minted session
    pub session: Session,
}

/// Envelope shape used only to pull `message` out of error bodies.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Extract the envelope `message` from an error response body, if any.
#[must_use]
pub fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message)
        .filter(|message| !message.is_empty())
}
