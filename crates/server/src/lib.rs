mod config;
mod pages;
mod state;
mod web;

pub use config::{AdminConfig, Config, ServerConfig, SessionStoreKind, CONFIG_ENV, PASSWORD_ENV};
pub use state::{AppState, ConsoleHandle, ConsoleRegistry, DEFAULT_IDLE_TIMEOUT};
pub use web::{router, SESSION_COOKIE};
