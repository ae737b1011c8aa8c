//! Admin session state and its persistence

use crate::error::SessionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};
use tracing::debug;
use uuid::Uuid;

/// Opaque identifier of one admin session (one browser)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for SessionId {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Whether a session has passed the admin password check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated { since: DateTime<Utc> },
}

impl SessionState {
    #[must_use]
    pub fn authenticated_now() -> Self {
        SessionState::Authenticated { since: Utc::now() }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }
}

/// Persistent storage of session flags; entries never expire
pub trait SessionStore: Send + Sync {
    /// Stored state, `Unauthenticated` for unknown sessions
    fn load(&self, id: &SessionId) -> Result<SessionState, SessionError>;

    /// Store a state; storing `Unauthenticated` forgets the session
    fn save(&self, id: &SessionId, state: &SessionState) -> Result<(), SessionError>;
}

/// Process-local store, lost on restart
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<SessionId, SessionState>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, id: &SessionId) -> Result<SessionState, SessionError> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(sessions.get(id).copied().unwrap_or_default())
    }

    fn save(&self, id: &SessionId, state: &SessionState) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut sessions, id, state);
        Ok(())
    }
}

/// JSON file store, survives restarts
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<SessionId, SessionState>, SessionError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, sessions: &HashMap<SessionId, SessionState>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(sessions)?;
        // Replace the file atomically
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, id: &SessionId) -> Result<SessionState, SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.get(id).copied().unwrap_or_default())
    }

    fn save(&self, id: &SessionId, state: &SessionState) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut sessions = self.read_all()?;
        apply(&mut sessions, id, state);
        self.write_all(&sessions)?;
        debug!("Saved session {} to {}", id, self.path.display());
        Ok(())
    }
}

fn apply(sessions: &mut HashMap<SessionId, SessionState>, id: &SessionId, state: &SessionState) {
    match state {
        SessionState::Unauthenticated => {
            sessions.remove(id);
        }
        SessionState::Authenticated { .. } => {
            sessions.insert(*id, *state);
        }
    }
}
