//! # Lexis Admin Core
//!
//! Shared types for the Lexis admin API client.
//!
//! The admin dashboard (topics, vocabulary, grammar, users, settings) talks to
//! its REST backend through a single authenticated client. This crate holds
//! the pieces that client and its collaborators agree on:
//!
//! - **Session**: the access/refresh token pair, valid only when complete
//! - **Credential Store**: the synchronous contract that owns the session
//! - **Envelope**: the backend's `{ data, message }` response wrapper
//! - **Errors**: a tagged taxonomy so 401 detection is a structural match
//!
//! ## Example
//!
//! ```
//! use lexis_admin_core::{CredentialStore, Session};
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct OneSlot(Mutex<Option<Session>>);
//!
//! impl CredentialStore for OneSlot {
//!     fn session(&self) -> Option<Session> {
//!         self.0.lock().ok()?.clone()
//!     }
//!     fn update_session(&self, session: Session) {
//!         if let Ok(mut slot) = self.0.lock() {
//!             *slot = Some(session);
//!         }
//!     }
//!     fn clear_session(&self) {
//!         if let Ok(mut slot) = self.0.lock() {
//!             *slot = None;
//!         }
//!     }
//! }
//!
//! # fn main() -> Result<(), lexis_admin_core::SessionError> {
//! let store = OneSlot::default();
//! store.update_session(Session::new("access", "refresh")?);
//! assert_eq!(store.access_token().as_deref(), Some("access"));
//! # Ok(())
//! # }
//! ```

pub mod credential;
pub mod envelope;
pub mod error;
pub mod session;

pub use credential::CredentialStore;
pub use envelope::{ApiEnvelope, RefreshRequest, SessionPayload};
pub use error::{RequestError, Result};
pub use session::{Session, SessionError};
