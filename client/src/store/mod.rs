//! Credential store implementations.
//!
//! - [`MemoryCredentialStore`]: process-lifetime session, nothing on disk
//! - [`FileCredentialStore`]: in-memory copy mirrored to a JSON file so a
//!   session survives restarts (the CLI uses this)

pub mod file;
pub mod memory;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;
