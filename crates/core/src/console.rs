//! Admin view-model over the remote application list
//!
//! A `Console` belongs to one admin session. It holds the session state,
//! the last fetched snapshot of applications and the notifications raised
//! since the last render.
//!
//! Remote calls are split in two halves so the owner does not have to hold
//! the console while waiting on the network: `begin_*` hands out a ticket
//! stamped with a monotonic sequence number, `finish_*` applies the result.
//! Sequence numbers decide which result wins when calls overlap:
//!
//! * a fetch is applied only if no later-issued fetch was applied before it;
//! * a confirmed update is applied unless a later-issued update of the same
//!   entry was confirmed before it;
//! * a confirmation is stamped with its own sequence number, and an applied
//!   fetch issued before that stamp keeps the confirmed status.

use crate::api::ApplicationsApi;
use crate::auth::SharedSecret;
use crate::error::ApiError;
use crate::models::{Application, Status, StatusCounts};
use crate::notification::Notification;
use crate::session::{SessionId, SessionState, SessionStore};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

const CONNECTION_FAILED: &str = "Could not connect to the server";

/// In-flight list fetch
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct FetchTicket {
    seq: u64,
}

/// In-flight status update
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct UpdateTicket {
    seq: u64,
    id: i64,
    status: Status,
}

impl UpdateTicket {
    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }
}

pub struct Console {
    session_id: SessionId,
    store: Arc<dyn SessionStore>,
    session: SessionState,
    applications: Vec<Application>,
    notifications: Vec<Notification>,
    last_seq: u64,
    // Tickets below this number were issued before the last logout
    floor: u64,
    applied_fetch: u64,
    in_flight_fetches: HashSet<u64>,
    confirmed: HashMap<i64, ConfirmedUpdate>,
}

/// Last applied update of one entry
#[derive(Debug)]
struct ConfirmedUpdate {
    issued: u64,
    confirmed: u64,
    status: Status,
}

impl Console {
    /// Open the console for a session, restoring its stored state
    pub fn restore(session_id: SessionId, store: Arc<dyn SessionStore>) -> Self {
        let session = store.load(&session_id).unwrap_or_else(|e| {
            warn!("Failed to load session {}: {}", session_id, e);
            SessionState::Unauthenticated
        });
        debug!("Restored session {} as {:?}", session_id, session);

        Self {
            session_id,
            store,
            session,
            applications: Vec::new(),
            notifications: Vec::new(),
            last_seq: 0,
            floor: 0,
            applied_fetch: 0,
            in_flight_fetches: HashSet::new(),
            confirmed: HashMap::new(),
        }
    }

    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Current snapshot, in the order the list endpoint returned it
    #[must_use]
    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        !self.in_flight_fetches.is_empty()
    }

    /// Whether the explicit refresh action is available
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.is_authenticated() && !self.is_loading()
    }

    /// Per-status counts over the current snapshot
    #[must_use]
    pub fn status_counts(&self) -> StatusCounts {
        StatusCounts::from_applications(&self.applications)
    }

    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Drain notifications for rendering
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Check the admin password
    ///
    /// On a match the session becomes authenticated, the flag is persisted
    /// and the ticket of the initial fetch is returned. On a mismatch an
    /// error notification is raised and nothing else changes.
    pub fn authenticate(&mut self, password: &str, secret: &SharedSecret) -> Option<FetchTicket> {
        if !secret.matches(password) {
            info!("Rejected admin login for session {}", self.session_id);
            self.notifications.push(Notification::error("Wrong password"));
            return None;
        }

        self.session = SessionState::authenticated_now();
        if let Err(e) = self.store.save(&self.session_id, &self.session) {
            warn!("Failed to persist session {}: {}", self.session_id, e);
            self.notifications.push(Notification::error(
                "Signed in, but the session could not be saved; you will need to sign in again after reloading",
            ));
        }
        info!("Admin session {} authenticated", self.session_id);

        self.begin_fetch()
    }

    /// Sign out, forgetting the persisted flag and the loaded snapshot
    pub fn logout(&mut self) {
        self.session = SessionState::Unauthenticated;
        if let Err(e) = self.store.save(&self.session_id, &self.session) {
            warn!("Failed to clear session {}: {}", self.session_id, e);
        }

        self.applications.clear();
        self.in_flight_fetches.clear();
        self.confirmed.clear();
        self.floor = self.last_seq + 1;
        info!("Admin session {} logged out", self.session_id);
    }

    /// Start a list fetch; `None` when not authenticated
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if !self.is_authenticated() {
            return None;
        }
        let seq = self.next_seq();
        self.in_flight_fetches.insert(seq);
        debug!("Fetch #{} started", seq);
        Some(FetchTicket { seq })
    }

    /// Apply the result of a list fetch
    pub fn finish_fetch(&mut self, ticket: FetchTicket, result: Result<Vec<Application>, ApiError>) {
        let seq = ticket.seq;
        self.in_flight_fetches.remove(&seq);
        if seq < self.floor {
            debug!("Dropping fetch #{} issued before logout", seq);
            return;
        }

        match result {
            Ok(mut applications) if seq > self.applied_fetch => {
                for app in &mut applications {
                    if let Some(update) = self.confirmed.get(&app.id) {
                        if update.confirmed > seq {
                            app.status = update.status.clone();
                        }
                    }
                }
                self.confirmed.retain(|_, update| update.confirmed > seq);
                self.applications = applications;
                self.applied_fetch = seq;
                info!("Loaded {} applications", self.applications.len());
            }
            Ok(_) => {
                debug!(
                    "Discarding stale fetch #{} (fetch #{} already applied)",
                    seq, self.applied_fetch
                );
            }
            Err(e) => {
                warn!("Failed to load applications: {}", e);
                let description = if e.is_transport() {
                    CONNECTION_FAILED
                } else {
                    "Could not load applications"
                };
                self.notifications.push(Notification::error(description));
            }
        }
    }

    /// Start a status update; `None` when not authenticated or when the
    /// target status is not one the endpoint accepts
    pub fn begin_update(&mut self, id: i64, status: Status) -> Option<UpdateTicket> {
        if !self.is_authenticated() {
            return None;
        }
        if !status.is_known() {
            self.notifications
                .push(Notification::error(format!("Unknown status '{status}'")));
            return None;
        }
        let seq = self.next_seq();
        debug!("Update #{} started: application {} -> {}", seq, id, status);
        Some(UpdateTicket { seq, id, status })
    }

    /// Apply the result of a status update
    ///
    /// Only the matching entry's status changes, and only after the
    /// endpoint confirmed it. The change also overrides any fetch already
    /// applied or still in flight. A failure leaves the snapshot untouched.
    pub fn finish_update(&mut self, ticket: UpdateTicket, result: Result<(), ApiError>) {
        let UpdateTicket { seq, id, status } = ticket;
        if seq < self.floor {
            debug!("Dropping update #{} issued before logout", seq);
            return;
        }

        if let Err(e) = result {
            warn!("Failed to update application {}: {}", id, e);
            let description = match e {
                ApiError::Rejected(Some(message)) => message,
                ApiError::Rejected(None) => "Could not update the status".to_string(),
                _ => CONNECTION_FAILED.to_string(),
            };
            self.notifications.push(Notification::error(description));
            return;
        }

        info!("Application {} is now {}", id, status);
        self.notifications.push(Notification::success(
            "Status updated",
            format!("Application #{id} is now {}", status.label()),
        ));

        let newer_update = self
            .confirmed
            .get(&id)
            .is_some_and(|update| update.issued > seq);
        if newer_update {
            debug!("Update #{} superseded by a later update", seq);
            return;
        }

        if let Some(app) = self.applications.iter_mut().find(|app| app.id == id) {
            app.status = status.clone();
        }
        let confirmed = self.next_seq();
        self.confirmed.insert(
            id,
            ConfirmedUpdate {
                issued: seq,
                confirmed,
                status,
            },
        );
    }

    /// Authenticate and run the initial fetch
    pub async fn login<A>(&mut self, api: &A, password: &str, secret: &SharedSecret) -> bool
    where
        A: ApplicationsApi + ?Sized,
    {
        let Some(ticket) = self.authenticate(password, secret) else {
            return false;
        };
        let result = api.list_applications().await;
        self.finish_fetch(ticket, result);
        true
    }

    /// Fetch and apply the application list
    pub async fn fetch_applications<A>(&mut self, api: &A)
    where
        A: ApplicationsApi + ?Sized,
    {
        if let Some(ticket) = self.begin_fetch() {
            let result = api.list_applications().await;
            self.finish_fetch(ticket, result);
        }
    }

    /// Update one application's status and apply the result
    pub async fn update_status<A>(&mut self, api: &A, id: i64, status: Status)
    where
        A: ApplicationsApi + ?Sized,
    {
        if let Some(ticket) = self.begin_update(id, status) {
            let result = api.update_status(ticket.id(), ticket.status()).await;
            self.finish_update(ticket, result);
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.last_seq += 1;
        self.last_seq
    }
}
