//! Admin API client implementation

use crate::config::{ACCEPT_JSON, ClientConfig, join_endpoint};
use crate::coordinator::{CycleGuard, RefreshCoordinator, RefreshOutcome, State, Ticket};
use crate::error::{ConfigError, transport_error};
use crate::metrics::{self, RefreshResult};
use crate::refresh::{RefreshError, SessionRefresher};
use crate::request::{ApiRequest, authorize};
use crate::response::ApiResponse;
use lexis_admin_core::{CredentialStore, RequestError, Session};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Authenticated admin API client.
///
/// Cheap to clone; clones share the HTTP connection pool, the credential
/// store and the refresh coordinator. Requests must be sent from within a
/// tokio runtime, which also runs the refresh cycle.
pub struct AdminClient<S> {
    inner: Arc<Inner<S>>,
}

struct Inner<S> {
    http: reqwest::Client,
    base: Url,
    config: ClientConfig,
    store: S,
    coordinator: Arc<RefreshCoordinator>,
    refresher: SessionRefresher,
}

impl<S: CredentialStore> Inner<S> {
    /// Run one refresh cycle and settle it.
    ///
    /// Success writes the new session before releasing followers; failure
    /// clears the session before rejecting them.
    async fn refresh_cycle(&self, guard: CycleGuard) -> RefreshOutcome {
        match self.refresher.refresh(&self.store).await {
            Ok(session) => {
                let access_token = session.access_token().to_owned();
                self.store.update_session(session);
                metrics::record_refresh(RefreshResult::Success);
                guard.succeed(access_token.clone());
                RefreshOutcome::Refreshed { access_token }
            }
            Err(reason) => {
                self.store.clear_session();
                metrics::record_refresh(match reason {
                    RefreshError::MissingRefreshToken => RefreshResult::Skipped,
                    _ => RefreshResult::Failure,
                });
                tracing::info!(reason = %reason, "could not refresh session");
                RefreshOutcome::Failed(guard.fail())
            }
        }
    }
}

impl<S> Clone for AdminClient<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for AdminClient<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminClient")
            .field("base", &self.inner.base.as_str())
            .field("state", &self.inner.coordinator.state())
            .finish_non_exhaustive()
    }
}

impl<S: CredentialStore + 'static> AdminClient<S> {
    /// Create a client for `config`, reading credentials from `store`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the base URL or refresh endpoint
    /// cannot be composed, or `ConfigError::HttpClient` if the HTTP client
    /// cannot be built.
    pub fn new(config: ClientConfig, store: S) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Self::with_http_client(config, store, http)
    }

    /// Create a client around an existing `reqwest::Client`.
    ///
    /// The caller's client keeps its own default headers and timeout; the
    /// refresh call still uses `config.refresh_timeout`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the base URL or refresh endpoint
    /// cannot be composed.
    pub fn with_http_client(
        config: ClientConfig,
        store: S,
        http: reqwest::Client,
    ) -> Result<Self, ConfigError> {
        let base = config.base_url()?;
        let refresh_endpoint = join_endpoint(&base, &config.refresh_path)?;
        let refresher = SessionRefresher::new(http.clone(), refresh_endpoint, config.refresh_timeout);

        tracing::debug!(base = %base, "admin client configured");

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base,
                config,
                store,
                coordinator: Arc::new(RefreshCoordinator::new()),
                refresher,
            }),
        })
    }

    /// Client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Composed base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    /// Credential store backing this client.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Whether a session refresh is currently in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.inner.coordinator.state() == State::Refreshing
    }

    /// Requests waiting on the in-flight refresh.
    #[must_use]
    pub fn pending_replays(&self) -> usize {
        self.inner.coordinator.pending()
    }

    /// Store a session obtained from sign-in.
    pub fn establish_session(&self, session: Session) {
        self.inner.store.update_session(session);
    }

    /// Drop the current session.
    pub fn sign_out(&self) {
        self.inner.store.clear_session();
    }

    /// Send a request, refreshing the session once on 401.
    ///
    /// # Errors
    ///
    /// - `RequestError::Http` for non-2xx responses, including a 401 that
    ///   survived (or could not be fixed by) a refresh
    /// - `RequestError::Network` / `RequestError::Timeout` on transport failure
    /// - `RequestError::InvalidRequest` if the path cannot be resolved
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, RequestError> {
        authorize(&mut request, &self.inner.store);

        let result = match self.dispatch(&request).await {
            Err(err) if err.is_unauthorized() && !request.is_retried() => {
                self.recover(request, err).await
            }
            other => other,
        };

        metrics::record_request(result.is_ok());
        result
    }

    /// Send a request and decode the envelope's `data`.
    ///
    /// # Errors
    ///
    /// Same as [`AdminClient::send`], plus `RequestError::Decode` if the body
    /// is not an envelope of `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, RequestError> {
        let response = self.send(request).await?;
        Ok(response.envelope::<T>()?.into_data())
    }

    /// `GET path`, returning the envelope's `data`.
    ///
    /// # Errors
    ///
    /// See [`AdminClient::fetch`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, RequestError> {
        self.fetch(ApiRequest::get(path)).await
    }

    /// `POST path` with a JSON body, returning the envelope's `data`.
    ///
    /// # Errors
    ///
    /// See [`AdminClient::fetch`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, RequestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(ApiRequest::post(path).json(body)?).await
    }

    /// `PUT path` with a JSON body, returning the envelope's `data`.
    ///
    /// # Errors
    ///
    /// See [`AdminClient::fetch`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, RequestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(ApiRequest::put(path).json(body)?).await
    }

    /// `PATCH path` with a JSON body, returning the envelope's `data`.
    ///
    /// # Errors
    ///
    /// See [`AdminClient::fetch`].
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T, RequestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(ApiRequest::patch(path).json(body)?).await
    }

    /// `DELETE path`, returning the envelope's `data`.
    ///
    /// # Errors
    ///
    /// See [`AdminClient::fetch`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, RequestError> {
        self.fetch(ApiRequest::delete(path)).await
    }

    /// Refresh-or-queue after a first-attempt 401.
    ///
    /// If the store already holds a different token than the one this request
    /// carried, a refresh finished in the meantime and the request is replayed
    /// directly. Otherwise the leader spawns the refresh cycle so that it runs
    /// to completion even if this caller is cancelled.
    async fn recover(
        &self,
        request: ApiRequest,
        trigger: RequestError,
    ) -> Result<ApiResponse, RequestError> {
        let changed = self
            .inner
            .store
            .access_token()
            .filter(|current| request.bearer() != Some(current.as_str()));
        if let Some(current) = changed {
            tracing::debug!(path = request.path(), "session changed since request was sent");
            return self.replay(request, &current).await;
        }

        let outcome = match self.inner.coordinator.begin(&trigger) {
            Ticket::Leader(guard) => {
                let inner = Arc::clone(&self.inner);
                match tokio::spawn(async move { inner.refresh_cycle(guard).await }).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::warn!(error = %e, "refresh task did not complete");
                        RefreshOutcome::Failed(trigger)
                    }
                }
            }
            Ticket::Follower(waiter) => waiter.outcome().await,
        };

        match outcome {
            RefreshOutcome::Refreshed { access_token } => self.replay(request, &access_token).await,
            RefreshOutcome::Failed(err) => Err(err),
        }
    }

    /// Reissue `request` with a fresh bearer token, bypassing refresh logic.
    async fn replay(
        &self,
        request: ApiRequest,
        access_token: &str,
    ) -> Result<ApiResponse, RequestError> {
        let request = request.with_bearer(access_token).mark_retried();
        metrics::record_replay();
        tracing::debug!(method = %request.method(), path = request.path(), "replaying request");
        self.dispatch(&request).await
    }

    /// One network round trip, no refresh handling.
    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse, RequestError> {
        let url = join_endpoint(&self.inner.base, request.path())
            .map_err(|e| RequestError::InvalidRequest(e.to_string()))?;

        tracing::debug!(
            method = %request.method(),
            path = request.path(),
            retried = request.is_retried(),
            "sending request"
        );

        let mut builder = self
            .inner
            .http
            .request(request.method().clone(), url)
            .headers(request.headers().clone());

        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.body_bytes() {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| transport_error(&e))?;
        let response = ApiResponse::read(response).await?;

        tracing::debug!(status = response.status().as_u16(), path = request.path(), "response received");

        response.error_for_status()
    }
}
