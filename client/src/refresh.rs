//! The refresh endpoint call.
//!
//! Sent outside the decorated request path: no bearer header, its own
//! timeout, and its failures never trigger another refresh.

use crate::error::transport_error;
use crate::response::ApiResponse;
use lexis_admin_core::{
    ApiEnvelope, CredentialStore, RefreshRequest, RequestError, Session, SessionPayload,
};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Why a refresh did not produce a new session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// The store held no refresh token; no call was made.
    #[error("No refresh token available")]
    MissingRefreshToken,

    /// Transport failure or non-2xx status from the refresh endpoint.
    #[error("Refresh request failed: {0}")]
    Request(#[from] RequestError),

    /// 2xx response that did not carry a valid session.
    #[error("Refresh response malformed: {0}")]
    Malformed(String),
}

/// Issues `POST <refresh endpoint>` with `{ "refreshToken": ... }`.
#[derive(Debug, Clone)]
pub struct SessionRefresher {
    http: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl SessionRefresher {
    /// Create a refresher for `endpoint`.
    #[must_use]
    pub const fn new(http: reqwest::Client, endpoint: Url, timeout: Duration) -> Self {
        Self {
            http,
            endpoint,
            timeout,
        }
    }

    /// Refresh endpoint URL.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Mint a new session from the store's refresh token.
    ///
    /// Does not touch the store; the caller decides whether to write or clear.
    ///
    /// # Errors
    ///
    /// - `RefreshError::MissingRefreshToken` if there is no session
    /// - `RefreshError::Request` on transport failure or a non-2xx status
    /// - `RefreshError::Malformed` if the envelope lacks a valid session
    pub async fn refresh<S: CredentialStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<Session, RefreshError> {
        let refresh_token = store
            .session()
            .map(|session| session.refresh_token().to_owned())
            .filter(|token| !token.is_empty())
            .ok_or(RefreshError::MissingRefreshToken)?;

        tracing::debug!(endpoint = %self.endpoint, "requesting new session");

        let response = self
            .http
            .post(self.endpoint.clone())
            .timeout(self.timeout)
            .json(&RefreshRequest::new(refresh_token))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let response = ApiResponse::read(response).await?.error_for_status()?;

        let envelope: ApiEnvelope<SessionPayload> = response
            .envelope()
            .map_err(|e| RefreshError::Malformed(e.to_string()))?;

        Ok(envelope.data.session)
    }
}
