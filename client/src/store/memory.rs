//! In-memory credential store.

use lexis_admin_core::{CredentialStore, Session};
use parking_lot::RwLock;

/// Session held in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    session: RwLock<Option<Session>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `session`.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    fn update_session(&self, session: Session) {
        *self.session.write() = Some(session);
    }

    fn clear_session(&self) {
        *self.session.write() = None;
    }
}
