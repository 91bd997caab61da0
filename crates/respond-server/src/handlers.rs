// respond-server/src/handlers.rs — demo routes, one per kind of response
use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::{header::IF_NONE_MATCH, HeaderMap, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use maud::{html, Markup, DOCTYPE};
use respond::{
    Classifier, ErrorWithStatus, Payload, Raw, RequestContext, RespondConfig, Responder,
    ResponseSink,
};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

const LOGO_SVG: &[u8] = br#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"><rect width="8" height="8"/></svg>"#;
const VERSION_ETAG: &str = "\"v1\"";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    classifier: Arc<Classifier>,
    config: RespondConfig,
}

impl AppState {
    pub fn new(config: RespondConfig) -> Self {
        let classifier = Classifier::new().with_status::<TaskError>();
        Self {
            classifier: Arc::new(classifier),
            config,
        }
    }

    fn respond<'r>(&'r self, req: &'r RequestContext) -> Responder<'r, ResponseSink> {
        respond::to(ResponseSink::new(), req)
            .classifier(&self.classifier)
            .config(self.config)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/hello", get(hello))
        .route("/users", post(create_user))
        .route("/users/:id", get(show_user).delete(delete_user))
        .route("/users/:id/profile", get(profile))
        .route("/old-users/:id", get(moved_user))
        .route("/tasks/:id", get(run_task))
        .route("/report.csv", get(report))
        .route("/logo.svg", get(logo))
        .route("/files/:name", get(download_file))
        .route("/dashboard", get(dashboard))
        .route("/version", get(version))
        .route("/boom", get(boom))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Domain
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct Task {
    pub id: u32,
    pub done: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task {0} not found")]
    NotFound(u32),
    #[error("task {0} is locked by another worker")]
    Locked(u32),
}

impl ErrorWithStatus for TaskError {
    fn status(&self) -> u16 {
        match self {
            TaskError::NotFound(_) => 404,
            TaskError::Locked(_) => 423,
        }
    }
}

fn find_user(id: u32) -> Option<User> {
    let name = match id {
        1 => "Alice",
        42 => "Bob",
        _ => return None,
    };
    Some(User {
        id,
        name: name.to_string(),
    })
}

fn find_task(id: u32) -> Result<Task, TaskError> {
    match id {
        1 => Ok(Task { id, done: true }),
        2 => Err(TaskError::Locked(id)),
        _ => Err(TaskError::NotFound(id)),
    }
}

// ============================================================================
// Views
// ============================================================================

fn layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                title { (title) }
            }
            body { (content) }
        }
    }
}

fn profile_view(user: &User) -> anyhow::Result<Markup> {
    Ok(layout(
        &user.name,
        html! {
            h1 { (user.name) }
            p { "User #" (user.id) }
        },
    ))
}

// ============================================================================
// Handlers
// ============================================================================

async fn index(req: RequestContext, State(state): State<AppState>) -> Response {
    let page = layout(
        "respond",
        html! {
            h1 { "respond demo" }
            ul {
                li { a href="/hello" { "JSON value" } }
                li { a href="/users/42" { "User" } }
                li { a href="/users/42/profile" { "Profile page" } }
                li { a href="/tasks/2" { "Failing task" } }
                li { a href="/report.csv" { "Raw download" } }
                li { a href="/old-users/42" { "Permanent redirect" } }
            }
        },
    );
    state.respond(&req).html(page)
}

async fn hello(req: RequestContext, State(state): State<AppState>) -> Response {
    state.respond(&req).ok("Hello World")
}

async fn show_user(
    req: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Response {
    let response = state.respond(&req);
    match find_user(id) {
        Some(user) => response.ok(user),
        None => response.not_found(format!("user not found: {}", id)),
    }
}

async fn create_user(
    req: RequestContext,
    State(state): State<AppState>,
    Json(new_user): Json<NewUser>,
) -> Response {
    let response = state.respond(&req);
    if new_user.name.trim().is_empty() {
        return response.bad_request("name is required");
    }
    response.created(User {
        id: 100,
        name: new_user.name,
    })
}

async fn delete_user(
    req: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Response {
    let response = state.respond(&req);
    match find_user(id) {
        Some(_) => response.no_content(),
        None => response.not_found(format!("user not found: {}", id)),
    }
}

async fn profile(
    req: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Response {
    let response = state.respond(&req);
    match find_user(id) {
        Some(user) => response.html_template(Some(&profile_view), &user),
        None => response.not_found(format!("user not found: {}", id)),
    }
}

async fn moved_user(
    req: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Response {
    state.respond(&req).redirect_permanent("/users/{}", &[&id])
}

async fn run_task(
    req: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Response {
    let task = find_task(id).with_context(|| format!("running task {}", id));
    state.respond(&req).reply_result(StatusCode::OK, task)
}

async fn report(req: RequestContext, State(state): State<AppState>) -> Response {
    let csv = "id,name\n1,Alice\n42,Bob\n".as_bytes().to_vec();
    let raw = Raw::new(Cursor::new(csv))
        .with_content_type("text/csv")
        .with_file_name("users.csv");
    state.respond(&req).ok(Payload::raw(raw))
}

async fn logo(req: RequestContext, State(state): State<AppState>) -> Response {
    state.respond(&req).serve_bytes("logo.svg", LOGO_SVG)
}

async fn download_file(
    req: RequestContext,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    let content = format!("This is {}\n", name);
    state.respond(&req).download_bytes(&name, content.as_bytes())
}

async fn dashboard(
    req: RequestContext,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let response = state.respond(&req);
    if !headers.contains_key("authorization") {
        return response.ok(Payload::redirect("/login"));
    }
    response.ok(serde_json::json!({ "widgets": ["tasks", "users"] }))
}

async fn version(
    req: RequestContext,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let response = state.respond(&req);
    let cached = headers
        .get(IF_NONE_MATCH)
        .is_some_and(|tag| tag.as_bytes() == VERSION_ETAG.as_bytes());
    if cached {
        return response.not_modified();
    }
    response.ok(serde_json::json!({ "version": env!("CARGO_PKG_VERSION") }))
}

async fn boom(req: RequestContext, State(state): State<AppState>) -> Response {
    state.respond(&req).fail_unknown()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(RespondConfig::default()))
    }

    async fn send(request: Request<Body>) -> (StatusCode, HeaderMap, String) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn get(uri: &str) -> (StatusCode, HeaderMap, String) {
        send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    #[rstest]
    #[case("/hello", StatusCode::OK, r#""Hello World""#)]
    #[case("/users/42", StatusCode::OK, r#"{"id":42,"name":"Bob"}"#)]
    #[case("/users/7", StatusCode::NOT_FOUND, r#"{"status":404,"message":"user not found: 7"}"#)]
    #[case("/tasks/1", StatusCode::OK, r#"{"id":1,"done":true}"#)]
    #[case("/tasks/2", StatusCode::LOCKED, r#"{"status":423,"message":"task 2 is locked by another worker"}"#)]
    #[case("/tasks/9", StatusCode::NOT_FOUND, r#"{"status":404,"message":"task 9 not found"}"#)]
    #[case("/boom", StatusCode::INTERNAL_SERVER_ERROR, r#"{"status":500,"message":"unknown error"}"#)]
    #[tokio::test]
    async fn test_json_routes(#[case] uri: &str, #[case] status: StatusCode, #[case] body: &str) {
        let (actual_status, headers, actual_body) = get(uri).await;
        assert_eq!(actual_status, status);
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(actual_body, body);
    }

    #[tokio::test]
    async fn test_create_user() {
        let request = Request::post("/users")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"Carol"}"#))
            .unwrap();
        let (status, _, body) = send(request).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, r#"{"id":100,"name":"Carol"}"#);

        let request = Request::post("/users")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":" "}"#))
            .unwrap();
        let (status, _, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, r#"{"status":400,"message":"name is required"}"#);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/users/1")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, "");
    }

    #[tokio::test]
    async fn test_profile_page() {
        let (status, headers, body) = get("/users/42/profile").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["content-type"], "text/html; charset=utf-8");
        assert!(body.contains("<h1>Bob</h1>"));
    }

    #[tokio::test]
    async fn test_report_download() {
        let (status, headers, body) = get("/report.csv").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["content-type"], "text/csv");
        assert_eq!(headers["content-disposition"], r#"attachment; filename="users.csv""#);
        assert_eq!(body, "id,name\n1,Alice\n42,Bob\n");
    }

    #[tokio::test]
    async fn test_serve_and_download_files() {
        let (_, headers, _) = get("/logo.svg").await;
        assert_eq!(headers["content-type"], "image/svg+xml");
        assert_eq!(headers["content-disposition"], "inline");

        let (_, headers, body) = get("/files/notes.txt").await;
        assert_eq!(headers["content-type"], "text/plain; charset=utf-8");
        assert_eq!(headers["content-disposition"], r#"attachment; filename="notes.txt""#);
        assert_eq!(body, "This is notes.txt\n");
    }

    #[tokio::test]
    async fn test_redirects() {
        let (status, headers, body) = get("/old-users/42").await;
        assert_eq!(status, StatusCode::PERMANENT_REDIRECT);
        assert_eq!(headers["location"], "/users/42");
        assert_eq!(body, "<a href=\"/users/42\">Permanent Redirect</a>.\n");

        let (status, headers, _) = get("/dashboard").await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(headers["location"], "/login");
    }

    #[tokio::test]
    async fn test_version_not_modified() {
        let request = Request::get("/version")
            .header(IF_NONE_MATCH, VERSION_ETAG)
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(request).await;
        assert_eq!(status, StatusCode::NOT_MODIFIED);
        assert_eq!(body, "");
    }
}
