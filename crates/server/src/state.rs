use loandesk_core::{ApplicationsApi, Console, SessionId, SessionStore, SharedSecret};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// A console shared between the requests of one admin session
pub type ConsoleHandle = Arc<tokio::sync::Mutex<Console>>;

/// Consoles untouched for this long are dropped from memory
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Shared state of the web front-end
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn ApplicationsApi>,
    pub secret: SharedSecret,
    pub sessions: Arc<dyn SessionStore>,
    pub consoles: ConsoleRegistry,
}

impl AppState {
    pub fn new(
        api: Arc<dyn ApplicationsApi>,
        secret: SharedSecret,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            api,
            secret,
            sessions,
            consoles: ConsoleRegistry::default(),
        }
    }
}

struct OpenConsole {
    handle: ConsoleHandle,
    last_used: Instant,
}

/// Open consoles of authenticated sessions
///
/// Idle consoles are evicted whenever a new one is opened. Eviction only
/// drops the in-memory view; the session itself lives in the session store,
/// so the next request restores the console and reloads the list.
#[derive(Clone)]
pub struct ConsoleRegistry {
    consoles: Arc<Mutex<HashMap<SessionId, OpenConsole>>>,
    idle_timeout: Duration,
}

impl Default for ConsoleRegistry {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl ConsoleRegistry {
    #[must_use]
    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            consoles: Arc::default(),
            idle_timeout,
        }
    }

    /// Look up an open console and mark it used
    #[must_use]
    pub fn get(&self, id: &SessionId) -> Option<ConsoleHandle> {
        let mut consoles = self.consoles.lock().unwrap_or_else(PoisonError::into_inner);
        consoles.get_mut(id).map(|open| {
            open.last_used = Instant::now();
            open.handle.clone()
        })
    }

    pub fn insert(&self, console: Console) -> ConsoleHandle {
        let id = console.session_id();
        let handle = Arc::new(tokio::sync::Mutex::new(console));
        let now = Instant::now();
        let mut consoles = self.consoles.lock().unwrap_or_else(PoisonError::into_inner);

        let before = consoles.len();
        consoles.retain(|_, open| now.duration_since(open.last_used) < self.idle_timeout);
        if consoles.len() < before {
            debug!("Evicted {} idle consoles", before - consoles.len());
        }

        consoles.insert(
            id,
            OpenConsole {
                handle: handle.clone(),
                last_used: now,
            },
        );
        handle
    }

    pub fn remove(&self, id: &SessionId) -> Option<ConsoleHandle> {
        let mut consoles = self.consoles.lock().unwrap_or_else(PoisonError::into_inner);
        consoles.remove(id).map(|open| open.handle)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.consoles.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
