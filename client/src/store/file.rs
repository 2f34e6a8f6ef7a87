//! File-backed credential store.
//!
//! The in-memory copy is authoritative: reads never touch the disk, and a
//! failed write is logged while the new session stays usable for the rest of
//! the process. The file holds the session as camelCase JSON and is created
//! owner-readable only on Unix.

use lexis_admin_core::{CredentialStore, Session};
use parking_lot::RwLock;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Session mirrored to a JSON file.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    session: RwLock<Option<Session>>,
}

impl FileCredentialStore {
    /// Open the store at `path`, loading any session already saved there.
    ///
    /// A missing file yields an empty store. An unreadable or invalid file
    /// (including a partial session) also yields an empty store, with a warning.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let session = load(&path);

        Self {
            path,
            session: RwLock::new(session),
        }
    }

    /// Backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, session: &Session) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(session).map_err(io::Error::other)?;
        let tmp = self.path.with_extension("json.tmp");

        let mut file = open_private(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &self.path)
    }
}

impl CredentialStore for FileCredentialStore {
    fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    fn update_session(&self, session: Session) {
        let mut slot = self.session.write();
        if let Err(e) = self.persist(&session) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to persist session");
        } else {
            tracing::debug!(path = %self.path.display(), "session persisted");
        }
        *slot = Some(session);
    }

    fn clear_session(&self) {
        let mut slot = self.session.write();
        *slot = None;
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "session file removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove session file");
            }
        }
    }
}

fn load(path: &Path) -> Option<Session> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read session file");
            return None;
        }
    };

    match serde_json::from_slice::<Session>(&bytes) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring invalid session file");
            None
        }
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
