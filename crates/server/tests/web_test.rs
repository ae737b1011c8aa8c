use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use loandesk_core::{
    ApiError, Application, ApplicationSubmission, ApplicationsApi, FileSessionStore,
    MemorySessionStore, SessionId, SessionStore, SharedSecret, Status,
};
use loandesk_server::{router, AppState, SESSION_COOKIE};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use tower::ServiceExt;

const PASSWORD: &str = "s3cret";

/// In-process stand-in for the remote endpoints
#[derive(Default)]
struct FakeApi {
    applications: Mutex<Vec<Application>>,
    list_calls: AtomicUsize,
    reject_updates: AtomicBool,
    submitted: Mutex<Vec<ApplicationSubmission>>,
}

impl FakeApi {
    fn with_applications(applications: Vec<Application>) -> Arc<Self> {
        Arc::new(Self {
            applications: Mutex::new(applications),
            ..Self::default()
        })
    }

    fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ApplicationsApi for FakeApi {
    async fn list_applications(&self) -> Result<Vec<Application>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.applications.lock().unwrap().clone())
    }

    async fn update_status(&self, id: i64, status: &Status) -> Result<(), ApiError> {
        if self.reject_updates.load(Ordering::SeqCst) {
            return Err(ApiError::Rejected(Some("Invalid status".to_string())));
        }
        let mut applications = self.applications.lock().unwrap();
        if let Some(app) = applications.iter_mut().find(|app| app.id == id) {
            app.status = status.clone();
        }
        Ok(())
    }

    async fn submit_application(
        &self,
        submission: &ApplicationSubmission,
    ) -> Result<Option<i64>, ApiError> {
        self.submitted.lock().unwrap().push(submission.clone());
        Ok(Some(100))
    }
}

fn application(id: i64, name: &str, status: Status) -> Application {
    Application {
        id,
        full_name: name.to_string(),
        phone: format!("+7 900 000-00-0{id}"),
        email: format!("applicant{id}@example.ru"),
        loan_amount: Some(100_000.0),
        loan_term: Some(12),
        purpose: Some("Home repair".to_string()),
        status,
        created_at: "2024-05-01T10:00:00".to_string(),
    }
}

fn sample() -> Vec<Application> {
    vec![
        application(9, "Ivanov Ivan", Status::New),
        application(8, "Petrova Anna", Status::New),
        application(7, "Sidorov Petr", Status::Processing),
        application(6, "Smirnova Olga", Status::Approved),
        application(5, "Kuznetsov Oleg", Status::Rejected),
    ]
}

fn setup(api: Arc<FakeApi>, sessions: Arc<dyn SessionStore>) -> Router {
    router(AppState::new(api, SharedSecret::new(PASSWORD), sessions))
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// `name=value` part of the response's session cookie
fn session_cookie(response: &Response) -> Option<String> {
    let value = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    let pair = value.split(';').next()?.trim().to_string();
    pair.starts_with(SESSION_COOKIE).then_some(pair)
}

async fn login(app: &Router) -> String {
    let response = send(app, post_form("/admin/login", &format!("password={PASSWORD}"), None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/admin");
    session_cookie(&response).expect("login sets a session cookie")
}

#[tokio::test]
async fn test_landing_page_calculator() {
    let app = setup(FakeApi::with_applications(vec![]), Arc::new(MemorySessionStore::new()));

    let page = body_text(send(&app, get("/", None)).await).await;
    assert!(page.contains("8\u{a0}333\u{a0}₽"));

    let page = body_text(send(&app, get("/?amount=250000&term=24", None)).await).await;
    assert!(page.contains("<strong id=\"monthly-payment\">10\u{a0}417\u{a0}₽</strong>"));
}

#[tokio::test]
async fn test_apply_submits_valid_form_only() {
    let api = FakeApi::with_applications(vec![]);
    let app = setup(api.clone(), Arc::new(MemorySessionStore::new()));

    let body = "full_name=Ivanov+Ivan&phone=%2B79990000000&email=ivan%40example.ru&amount=100000&term=12&purpose=";
    let page = body_text(send(&app, post_form("/apply", body, None)).await).await;
    assert!(page.contains("Application sent!"));
    // Form is reset after a successful submission
    assert!(!page.contains("Ivanov Ivan"));
    assert_eq!(api.submitted.lock().unwrap().len(), 1);
    assert_eq!(api.submitted.lock().unwrap()[0].full_name, "Ivanov Ivan");

    let body = "full_name=Ivanov+Ivan&phone=&email=ivan%40example.ru";
    let page = body_text(send(&app, post_form("/apply", body, None)).await).await;
    assert!(page.contains("required field: phone"));
    // Form is kept for correction
    assert!(page.contains("Ivanov Ivan"));
    assert_eq!(api.submitted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_wrong_password_stays_signed_out() {
    let api = FakeApi::with_applications(sample());
    let app = setup(api.clone(), Arc::new(MemorySessionStore::new()));

    let response = send(&app, post_form("/admin/login", "password=guess", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());
    let page = body_text(response).await;
    assert!(page.contains("Wrong password"));
    assert!(page.contains("Admin sign-in"));
    assert_eq!(api.list_calls(), 0);
}

#[tokio::test]
async fn test_login_fetches_once_and_renders_list() {
    let api = FakeApi::with_applications(sample());
    let app = setup(api.clone(), Arc::new(MemorySessionStore::new()));

    let cookie = login(&app).await;
    assert_eq!(api.list_calls(), 1);

    let page = body_text(send(&app, get("/admin", Some(&cookie))).await).await;
    assert!(page.contains("Sidorov Petr"));
    assert!(page.contains(r#"<strong id="total">5</strong>"#));
    assert!(page.contains(r#"<strong id="count-new">2</strong>"#));
    assert!(page.contains(r#"<strong id="count-processing">1</strong>"#));
    // Rendering does not fetch again
    assert_eq!(api.list_calls(), 1);

    // Without the cookie the login form is shown
    let page = body_text(send(&app, get("/admin", None)).await).await;
    assert!(page.contains("Admin sign-in"));
    assert!(!page.contains("Sidorov Petr"));
}

#[tokio::test]
async fn test_status_update_moves_counts() {
    let api = FakeApi::with_applications(sample());
    let app = setup(api.clone(), Arc::new(MemorySessionStore::new()));
    let cookie = login(&app).await;

    let response = send(
        &app,
        post_form("/admin/applications/7/status", "status=approved", Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let page = body_text(send(&app, get("/admin", Some(&cookie))).await).await;
    assert!(page.contains("Status updated"));
    assert!(page.contains(r#"<strong id="count-approved">2</strong>"#));
    assert!(page.contains(r#"<strong id="count-processing">0</strong>"#));
    // The confirmed change is applied locally, without another fetch
    assert_eq!(api.list_calls(), 1);

    // Notifications are shown once
    let page = body_text(send(&app, get("/admin", Some(&cookie))).await).await;
    assert!(!page.contains("Status updated"));
}

#[tokio::test]
async fn test_status_form_without_selection_changes_nothing() {
    let api = FakeApi::with_applications(sample());
    let app = setup(api.clone(), Arc::new(MemorySessionStore::new()));
    let cookie = login(&app).await;

    let response = send(
        &app,
        post_form("/admin/applications/7/status", "", Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let page = body_text(send(&app, get("/admin", Some(&cookie))).await).await;
    assert!(!page.contains("Status updated"));
    assert!(!page.contains("Unknown status"));
    assert!(page.contains(r#"<strong id="count-processing">1</strong>"#));
    assert_eq!(api.applications.lock().unwrap()[2].status, Status::Processing);
}

#[tokio::test]
async fn test_rejected_update_keeps_counts() {
    let api = FakeApi::with_applications(sample());
    api.reject_updates.store(true, Ordering::SeqCst);
    let app = setup(api.clone(), Arc::new(MemorySessionStore::new()));
    let cookie = login(&app).await;

    send(
        &app,
        post_form("/admin/applications/7/status", "status=approved", Some(&cookie)),
    )
    .await;

    let page = body_text(send(&app, get("/admin", Some(&cookie))).await).await;
    assert!(page.contains("Invalid status"));
    assert!(page.contains(r#"<strong id="count-approved">1</strong>"#));
    assert!(page.contains(r#"<strong id="count-processing">1</strong>"#));
}

#[tokio::test]
async fn test_refresh_refetches_for_signed_in_sessions_only() {
    let api = FakeApi::with_applications(sample());
    let app = setup(api.clone(), Arc::new(MemorySessionStore::new()));

    let response = send(&app, post_form("/admin/refresh", "", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(api.list_calls(), 0);

    let cookie = login(&app).await;
    api.applications
        .lock()
        .unwrap()
        .insert(0, application(10, "Volkova Maria", Status::New));
    send(&app, post_form("/admin/refresh", "", Some(&cookie))).await;
    assert_eq!(api.list_calls(), 2);

    let page = body_text(send(&app, get("/admin", Some(&cookie))).await).await;
    assert!(page.contains("Volkova Maria"));
    assert!(page.contains(r#"<strong id="total">6</strong>"#));
}

#[tokio::test]
async fn test_logout_clears_persisted_flag() {
    let sessions = Arc::new(MemorySessionStore::new());
    let app = setup(FakeApi::with_applications(sample()), sessions.clone());
    let cookie = login(&app).await;
    let id: SessionId = cookie
        .trim_start_matches(&format!("{SESSION_COOKIE}="))
        .parse()
        .unwrap();
    assert!(sessions.load(&id).unwrap().is_authenticated());

    let response = send(&app, post_form("/admin/logout", "", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("Max-Age=0"));
    assert!(!sessions.load(&id).unwrap().is_authenticated());

    // Reloading with the old cookie shows the login form
    let page = body_text(send(&app, get("/admin", Some(&cookie))).await).await;
    assert!(page.contains("Admin sign-in"));
}

#[tokio::test]
async fn test_session_survives_restart_with_file_store() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("sessions.json");

    let first_api = FakeApi::with_applications(sample());
    let first = setup(first_api, Arc::new(FileSessionStore::new(&path)));
    let cookie = login(&first).await;

    // A new process over the same file: the console is restored and loads
    // the list as a fresh page would
    let second_api = FakeApi::with_applications(sample());
    let second = setup(second_api.clone(), Arc::new(FileSessionStore::new(&path)));
    let page = body_text(send(&second, get("/admin", Some(&cookie))).await).await;
    assert!(page.contains("Ivanov Ivan"));
    assert_eq!(second_api.list_calls(), 1);
}
