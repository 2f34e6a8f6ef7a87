//! The authenticated session.
//!
//! A [`Session`] is either complete (both tokens present and non-empty) or it
//! does not exist. There is no partially-populated state: construction and
//! deserialization both reject empty tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised when building a [`Session`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// One of the two tokens was empty.
    #[error("session {0} must not be empty")]
    EmptyToken(&'static str),
}

/// Access and refresh credentials for the admin API.
///
/// Replaced wholesale on refresh; fields are never mutated in place.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SessionParts")]
pub struct Session {
    access_token: String,
    refresh_token: String,
}

impl Session {
    /// Create a session from its two tokens.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyToken`] if either token is empty.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Result<Self, SessionError> {
        let access_token = access_token.into();
        let refresh_token = refresh_token.into();

        if access_token.is_empty() {
            return Err(SessionError::EmptyToken("access token"));
        }
        if refresh_token.is_empty() {
            return Err(SessionError::EmptyToken("refresh token"));
        }

        Ok(Self {
            access_token,
            refresh_token,
        })
    }

    /// Short-lived bearer credential.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Credential used only to mint a new access token.
    #[must_use]
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionParts {
    access_token: String,
    refresh_token: String,
}

impl TryFrom<SessionParts> for Session {
    type Error = SessionError;

    fn try_from(parts: SessionParts) -> Result<Self, Self::Error> {
        Self::new(parts.access_token, parts.refresh_token)
    }
}
