mod auth;
mod error;
mod models;
mod notification;

pub mod api;
pub mod calculator;
pub mod console;
pub mod format;
pub mod intake;
pub mod session;

pub use api::{ApplicationsApi, EndpointConfig, HttpApplicationsApi};
pub use auth::SharedSecret;
pub use calculator::LoanQuote;
pub use console::{Console, FetchTicket, UpdateTicket};
pub use error::{ApiError, FormError, SessionError};
pub use intake::{ApplicationForm, ApplicationSubmission, IntakeOutcome};
pub use models::{
    Application, ListResponse, Status, StatusCounts, SubmitApplicationResponse, UnknownStatus,
    UpdateStatusRequest, UpdateStatusResponse,
};
pub use notification::{Notification, NotificationKind};
pub use session::{FileSessionStore, MemorySessionStore, SessionId, SessionState, SessionStore};
