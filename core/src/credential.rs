//! Credential store contract.
//!
//! The store exclusively owns the current [`Session`]. The client only reads
//! it and asks for wholesale replacement or removal.
//!
//! # Implementation Notes
//!
//! - All methods are synchronous and cheap; they are called on every request
//! - Reads must observe the most recent `update_session` immediately
//! - Persistence failures are the store's concern and must not panic

use crate::session::Session;
use std::sync::Arc;

/// Holder of the current session.
pub trait CredentialStore: Send + Sync {
    /// Current session, if signed in.
    fn session(&self) -> Option<Session>;

    /// Replace the session wholesale.
    fn update_session(&self, session: Session);

    /// Drop the session (sign-out or failed refresh).
    fn clear_session(&self);

    /// Convenience accessor for the bearer credential.
    fn access_token(&self) -> Option<String> {
        self.session().map(|session| session.access_token().to_owned())
    }
}

impl<S: CredentialStore + ?Sized> CredentialStore for Arc<S> {
    fn session(&self) -> Option<Session> {
        (**self).session()
    }

    fn update_session(&self, session: Session) {
        (**self).update_session(session);
    }

    fn clear_session(&self) {
        (**self).clear_session();
    }
}

impl<S: CredentialStore + ?Sized> CredentialStore for &S {
    fn session(&self) -> Option<Session> {
        (**self).session()
    }

    fn update_session(&self, session: Session) {
        (**self).update_session(session);
    }

    fn clear_session(&self) {
        (**self).clear_session();
    }
}
