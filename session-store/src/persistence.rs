//! Durable session cache.
//!
//! Persists the last-known session so the app can restore a UI-usable
//! state before the identity stream reconnects. The stored blob is
//! provisional by definition: restored sessions must be revalidated by
//! the live stream before privileged actions are allowed.

use crate::identity::Identity;
use authz_core::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;

/// The persisted session snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub identity: Identity,
    pub role: Role,
    pub school_id: String,
    pub saved_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn from_identity(identity: Identity) -> Self {
        let role = identity.role;
        let school_id = identity.school_id.clone();
        Self {
            identity,
            role,
            school_id,
            saved_at: Utc::now(),
        }
    }
}

/// Local durable storage for the session blob.
///
/// Single writer: only the session store calls these. `clear` must be
/// atomic so a crash mid-logout never leaves a partially written blob.
pub trait SessionPersistence: Send + Sync {
    fn save(&self, session: &StoredSession) -> io::Result<()>;
    fn load(&self) -> io::Result<Option<StoredSession>>;
    fn clear(&self) -> io::Result<()>;
}

/// File-backed session cache.
///
/// Writes go to a temp file in the same directory followed by a rename,
/// so readers and crash recovery only ever see a complete blob or none.
#[derive(Debug, Clone)]
pub struct FileSessionCache {
    path: PathBuf,
}

impl FileSessionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionPersistence for FileSessionCache {
    fn save(&self, session: &StoredSession) -> io::Result<()> {
        let json = serde_json::to_vec(session)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)
    }

    fn load(&self) -> io::Result<Option<StoredSession>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        match serde_json::from_slice(&bytes) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                // A corrupt blob is discarded, not fatal; the live stream
                // will rebuild the session.
                tracing::warn!(error = %e, path = %self.path.display(), "Discarding corrupt session cache");
                let _ = std::fs::remove_file(&self.path);
                Ok(None)
            }
        }
    }

    fn clear(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
