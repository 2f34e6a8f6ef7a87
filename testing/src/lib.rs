//! # Lexis Admin Testing
//!
//! Testing utilities for the Lexis admin client.
//!
//! This crate provides:
//! - [`RecordingCredentialStore`]: an in-memory store that counts how often
//!   it is read, written and cleared
//! - [`fixtures`]: `wiremock` mounts for the admin API (protected endpoints,
//!   401 fallbacks, the refresh endpoint) and request inspection helpers
//!
//! ## Example
//!
//! ```ignore
//! use lexis_admin_testing::{RecordingCredentialStore, fixtures};
//! use wiremock::MockServer;
//!
//! #[tokio::test]
//! async fn refreshes_once() {
//!     let server = MockServer::start().await;
//!     fixtures::mount_protected(&server, "GET", "/topics", "new", serde_json::json!([])).await;
//!     fixtures::mount_unauthorized(&server, "GET", "/topics").await;
//!     fixtures::mount_refresh_success(&server, "r1", "new", "r2").await;
//!
//!     let store = RecordingCredentialStore::with_session(fixtures::session("old", "r1"));
//!     // ... build a client against server.uri() and send requests
//!     assert_eq!(fixtures::count_requests(&server, fixtures::REFRESH_PATH).await, 1);
//! }
//! ```

pub mod fixtures;
pub mod mocks;

pub use mocks::RecordingCredentialStore;

/// Install a test-writer tracing subscriber honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
