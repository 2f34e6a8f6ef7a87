//! Mock credential store.

use lexis_admin_core::{CredentialStore, Session};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory store that records every interaction.
///
/// Lets tests assert not only the final session but also how many times the
/// client read, replaced or cleared it.
///
/// # Example
///
/// ```
/// use lexis_admin_core::{CredentialStore, Session};
/// use lexis_admin_testing::RecordingCredentialStore;
///
/// let store = RecordingCredentialStore::new();
/// store.update_session(Session::new("a", "r").unwrap());
/// store.clear_session();
///
/// assert_eq!(store.update_count(), 1);
/// assert_eq!(store.clear_count(), 1);
/// assert!(store.current().is_none());
/// ```
#[derive(Debug, Default)]
pub struct RecordingCredentialStore {
    session: Mutex<Option<Session>>,
    reads: AtomicUsize,
    updates: AtomicUsize,
    clears: AtomicUsize,
}

impl RecordingCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `session`.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
            ..Self::default()
        }
    }

    /// Current session, without counting as a read.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.session.lock().clone()
    }

    /// Number of `session()` calls.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `update_session()` calls.
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Number of `clear_session()` calls.
    #[must_use]
    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl CredentialStore for RecordingCredentialStore {
    fn session(&self) -> Option<Session> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.session.lock().clone()
    }

    fn update_session(&self, session: Session) {
        self.updates.fetch_add(1, Ordering::SeqCst);
        *self.session.lock() = Some(session);
    }

    fn clear_session(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
        *self.session.lock() = None;
    }
}
