use crate::pages::{self, ConsoleView};
use crate::state::{AppState, ConsoleHandle};
use axum::extract::{Form, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use loandesk_core::calculator::quote_from_input;
use loandesk_core::{intake, ApplicationForm, Console, FetchTicket, SessionId, Status, UpdateTicket};
use serde::Deserialize;
use tracing::{error, info};

/// Name of the cookie carrying the admin session id
pub const SESSION_COOKIE: &str = "loandesk_session";

const ADMIN_PATH: &str = "/admin";

/// Build the site router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/apply", post(apply))
        .route(ADMIN_PATH, get(admin))
        .route("/admin/login", post(login))
        .route("/admin/logout", post(logout))
        .route("/admin/refresh", post(refresh))
        .route("/admin/applications/{id}/status", post(update_status))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct CalculatorQuery {
    amount: Option<String>,
    term: Option<String>,
}

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    password: String,
}

#[derive(Debug, Deserialize)]
struct StatusForm {
    #[serde(default)]
    status: String,
}

/// Session id from the request's cookies
fn session_id(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| value.parse().ok())
}

fn session_cookie(id: SessionId) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

fn back_to_admin() -> Redirect {
    Redirect::to(ADMIN_PATH)
}

/// Run a list fetch to completion and apply it to the console
///
/// The remote call runs on its own task so an abandoned request still
/// settles its ticket.
async fn complete_fetch(state: &AppState, handle: &ConsoleHandle, ticket: FetchTicket) {
    let api = state.api.clone();
    let handle = handle.clone();
    let task = tokio::spawn(async move {
        let result = api.list_applications().await;
        handle.lock().await.finish_fetch(ticket, result);
    });
    if let Err(e) = task.await {
        error!("Fetch task failed: {}", e);
    }
}

async fn complete_update(state: &AppState, handle: &ConsoleHandle, ticket: UpdateTicket) {
    let api = state.api.clone();
    let handle = handle.clone();
    let task = tokio::spawn(async move {
        let result = api.update_status(ticket.id(), ticket.status()).await;
        handle.lock().await.finish_update(ticket, result);
    });
    if let Err(e) = task.await {
        error!("Update task failed: {}", e);
    }
}

/// Console of the request's session if it is authenticated
///
/// A session not open in this process is restored from the session store;
/// restoring an authenticated session loads the list like a fresh page.
async fn authenticated_console(state: &AppState, headers: &HeaderMap) -> Option<ConsoleHandle> {
    let id = session_id(headers)?;

    if let Some(handle) = state.consoles.get(&id) {
        if handle.lock().await.is_authenticated() {
            return Some(handle);
        }
        state.consoles.remove(&id);
        return None;
    }

    let console = Console::restore(id, state.sessions.clone());
    if !console.is_authenticated() {
        return None;
    }
    let handle = state.consoles.insert(console);
    let ticket = handle.lock().await.begin_fetch();
    if let Some(ticket) = ticket {
        complete_fetch(state, &handle, ticket).await;
    }
    Some(handle)
}

/// Log a session out, whether or not its console is open
async fn end_session(state: &AppState, id: SessionId) {
    match state.consoles.remove(&id) {
        Some(handle) => handle.lock().await.logout(),
        None => Console::restore(id, state.sessions.clone()).logout(),
    }
}

async fn landing(Query(query): Query<CalculatorQuery>) -> Html<String> {
    let quote = quote_from_input(query.amount.as_deref(), query.term.as_deref());
    pages::landing(&quote, &ApplicationForm::default(), &[])
}

async fn apply(State(state): State<AppState>, Form(form): Form<ApplicationForm>) -> Html<String> {
    let outcome = intake::submit_application(state.api.as_ref(), &form).await;
    let form = if outcome.accepted {
        ApplicationForm::default()
    } else {
        form
    };
    let quote = quote_from_input(Some(form.amount.as_str()), Some(form.term.as_str()));
    pages::landing(&quote, &form, &[outcome.notification])
}

async fn admin(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    let Some(handle) = authenticated_console(&state, &headers).await else {
        return pages::login(&[]);
    };

    let mut console = handle.lock().await;
    let notifications = console.take_notifications();
    let counts = console.status_counts();
    pages::console(&ConsoleView {
        applications: console.applications(),
        counts,
        loading: console.is_loading(),
        can_refresh: console.can_refresh(),
        notifications: &notifications,
    })
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    let mut console = Console::restore(SessionId::new(), state.sessions.clone());
    let Some(ticket) = console.authenticate(&form.password, &state.secret) else {
        let notifications = console.take_notifications();
        return (StatusCode::UNAUTHORIZED, pages::login(&notifications)).into_response();
    };

    // A successful login always starts a fresh session id
    if let Some(previous) = session_id(&headers) {
        end_session(&state, previous).await;
    }

    let id = console.session_id();
    let handle = state.consoles.insert(console);
    complete_fetch(&state, &handle, ticket).await;
    info!("Admin signed in (session {})", id);

    (
        [(header::SET_COOKIE, session_cookie(id))],
        back_to_admin(),
    )
        .into_response()
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(id) = session_id(&headers) {
        end_session(&state, id).await;
    }

    (
        [(header::SET_COOKIE, expired_session_cookie())],
        back_to_admin(),
    )
        .into_response()
}

async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Redirect {
    if let Some(handle) = authenticated_console(&state, &headers).await {
        let ticket = {
            let mut console = handle.lock().await;
            if console.can_refresh() {
                console.begin_fetch()
            } else {
                None
            }
        };
        if let Some(ticket) = ticket {
            complete_fetch(&state, &handle, ticket).await;
        }
    }
    back_to_admin()
}

async fn update_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> Redirect {
    // A disabled option submits nothing
    if form.status.is_empty() {
        return back_to_admin();
    }
    if let Some(handle) = authenticated_console(&state, &headers).await {
        let ticket = handle
            .lock()
            .await
            .begin_update(id, Status::from(form.status));
        if let Some(ticket) = ticket {
            complete_update(&state, &handle, ticket).await;
        }
    }
    back_to_admin()
}
