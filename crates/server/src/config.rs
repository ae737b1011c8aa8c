use anyhow::{Context, Result};
use loandesk_core::{EndpointConfig, FileSessionStore, MemorySessionStore, SessionStore, SharedSecret};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Environment variable overriding `admin.password`
pub const PASSWORD_ENV: &str = "LOANDESK_ADMIN_PASSWORD";

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "LOANDESK_CONFIG";

const SEARCH_PATHS: [&str; 2] = ["./loandesk.toml", "/etc/loandesk/config.toml"];

/// `LoanDesk` server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Remote application endpoints
    #[serde(default)]
    pub api: EndpointConfig,

    /// Admin console configuration
    #[serde(default)]
    pub admin: AdminConfig,
}

/// HTTP binding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Where admin session flags are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStoreKind {
    /// Lost on restart
    #[default]
    Memory,
    /// JSON file at `session_path`
    File,
}

/// Admin console configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Shared admin password; `LOANDESK_ADMIN_PASSWORD` takes precedence
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    #[serde(default)]
    pub session_store: SessionStoreKind,

    /// Path of the session file (only used when `session_store = "file"`)
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,

    /// Seconds after which an unused console is dropped from memory
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("session_store", &self.session_store)
            .field("session_path", &self.session_path)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .finish()
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_idle_timeout_secs() -> u64 {
    crate::state::DEFAULT_IDLE_TIMEOUT.as_secs()
}

fn default_session_path() -> PathBuf {
    if cfg!(debug_assertions) {
        PathBuf::from("./loandesk-sessions.json")
    } else {
        PathBuf::from("/var/lib/loandesk/sessions.json")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password: None,
            session_store: SessionStoreKind::default(),
            session_path: default_session_path(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

impl AdminConfig {
    /// Resolve the admin password, preferring the environment
    pub fn secret(&self) -> Result<SharedSecret> {
        let from_env = std::env::var(PASSWORD_ENV).ok();
        self.secret_with(from_env)
    }

    fn secret_with(&self, from_env: Option<String>) -> Result<SharedSecret> {
        from_env
            .filter(|password| !password.is_empty())
            .or_else(|| self.password.clone())
            .filter(|password| !password.is_empty())
            .map(SharedSecret::new)
            .with_context(|| {
                format!("Admin password is not configured: set {PASSWORD_ENV} or admin.password")
            })
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Build the configured session store
    #[must_use]
    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        match self.session_store {
            SessionStoreKind::Memory => Arc::new(MemorySessionStore::new()),
            SessionStoreKind::File => Arc::new(FileSessionStore::new(&self.session_path)),
        }
    }
}

impl Config {
    /// Read a TOML config file; a file that does not exist yields the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))
            }
        };

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load the file named by `LOANDESK_CONFIG`, or else the first of
    /// `./loandesk.toml` and `/etc/loandesk/config.toml` that exists
    ///
    /// A file named by `LOANDESK_CONFIG` has to exist.
    pub fn load_default() -> Result<Self> {
        Self::load_from(std::env::var_os(CONFIG_ENV).map(PathBuf::from))
    }

    fn load_from(explicit: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = explicit {
            anyhow::ensure!(
                path.exists(),
                "{CONFIG_ENV} names a missing file: {}",
                path.display()
            );
            return Self::load(path);
        }

        match SEARCH_PATHS.iter().map(Path::new).find(|path| path.exists()) {
            Some(path) => Self::load(path),
            None => {
                tracing::info!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Defaults as TOML, printed by `loandesk --example-config`
    ///
    /// The admin password is never serialized.
    pub fn example() -> Result<String> {
        toml::to_string_pretty(&Config::default()).context("Failed to serialize example config")
    }
}
