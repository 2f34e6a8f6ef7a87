//! # Lexis Admin API Client
//!
//! Authenticated HTTP client for the Lexis admin API. Every request carries
//! the current access token; a 401 triggers exactly one session refresh no
//! matter how many requests hit it at once, and every request that was
//! waiting on that refresh is replayed with the new token (or rejected
//! together if the refresh fails).
//!
//! ## Example
//!
//! ```no_run
//! use lexis_admin_client::{AdminClient, ClientConfig, MemoryCredentialStore};
//! use lexis_admin_core::Session;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads LEXIS_API_ROOT, LEXIS_API_PREFIX, ...
//!     let config = ClientConfig::from_env()?;
//!
//!     let client = AdminClient::new(config, MemoryCredentialStore::new())?;
//!     client.establish_session(Session::new("access", "refresh")?);
//!
//!     let topics: serde_json::Value = client.get("/topics").await?;
//!     println!("{topics:#}");
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - Bearer token attached from a pluggable [`CredentialStore`](lexis_admin_core::CredentialStore)
//! - Single-flight refresh with queued replays
//! - Separate timeouts for ordinary requests and the refresh call
//! - Envelope (`{ data, message }`) decoding helpers
//! - In-memory and file-backed credential stores
//! - Request/refresh counters via the `metrics` facade

pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod refresh;
pub mod request;
pub mod response;
pub mod store;

// Re-export main types for convenience
pub use client::AdminClient;
pub use config::ClientConfig;
pub use coordinator::{RefreshCoordinator, RefreshOutcome, State, Ticket};
pub use error::ConfigError;
pub use metrics::describe_metrics;
pub use refresh::{RefreshError, SessionRefresher};
pub use request::{ApiRequest, authorize};
pub use response::ApiResponse;
pub use store::{FileCredentialStore, MemoryCredentialStore};
