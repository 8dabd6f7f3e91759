//! Advisor HTTP API
//!
//! Axum server that stands in for the chat front end: account pages, the chat
//! transcript and its sidebar controls, and the CSV download.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a pure
//! inner function returning `(StatusCode, Value)`. The inner functions are
//! directly testable without axum dispatch machinery.
//!
//! Endpoints:
//! - GET  /health           : health check with DB status
//! - GET  /version          : server version info
//! - POST /register         : create an account
//! - POST /login            : verify credentials, open a chat session
//! - POST /logout           : end the chat session
//! - GET  /chat             : current transcript and controls
//! - POST /chat             : submit a prompt
//! - POST /chat/new         : archive and start a new chat
//! - POST /chat/resume      : restore the archived chat
//! - POST /chat/clear       : archive and clear the chat
//! - PUT  /chat/deep-search : toggle deep-search mode
//! - GET  /chat/export      : last recommendation table as CSV
//!
//! Chat endpoints require `Authorization: Bearer <token>` from `/login`.

use std::sync::Arc;

use advisor_core::export::{table_to_csv, EXPORT_FILE_NAME};
use advisor_core::models::CATEGORY_FILTERS;
use advisor_core::{
    AuthService, AuthState, ChatBackend, ChatSession, LoginOutcome, RegisterOutcome,
    SessionSettings, TurnOutcome,
};
use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::sessions::{SessionRegistry, SharedSession};

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub auth: AuthService,
    pub sessions: SessionRegistry,
    pub backend: Arc<dyn ChatBackend>,
    pub settings: SessionSettings,
}

impl HttpState {
    pub fn new(auth: AuthService, backend: Arc<dyn ChatBackend>, settings: SessionSettings) -> Self {
        Self {
            auth,
            sessions: SessionRegistry::new(),
            backend,
            settings,
        }
    }

    fn pool(&self) -> &SqlitePool {
        self.auth.store().pool()
    }
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/chat", get(chat_view_handler).post(submit_handler))
        .route("/chat/new", post(new_chat_handler))
        .route("/chat/resume", post(resume_chat_handler))
        .route("/chat/clear", post(clear_history_handler))
        .route("/chat/deep-search", put(deep_search_handler))
        .route("/chat/export", get(export_handler))
        .with_state(state)
}

/// Start the HTTP server on `addr`.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    addr: &str,
    state: HttpState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let app = build_router(Arc::new(state));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Advisor HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeepSearchRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct ExportQuery {
    pub category: Option<String>,
}

/// Sidebar controls that rewrite the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    NewChat,
    Resume,
    ClearHistory,
}

// ============================================================================
// Helpers
// ============================================================================

fn error_body(msg: impl Into<String>) -> Value {
    json!({
        "error": msg.into(),
        "status": "error",
    })
}

fn unauthorized() -> (StatusCode, Value) {
    (
        StatusCode::UNAUTHORIZED,
        error_body("missing or unknown session token"),
    )
}

/// Extract the session token from `Authorization: Bearer <uuid>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    Uuid::parse_str(token.trim()).ok()
}

async fn lookup(state: &HttpState, token: Option<Uuid>) -> Option<SharedSession> {
    state.sessions.get(&token?).await
}

/// Transcript plus sidebar state, as rendered by the chat page.
pub fn session_view(session: &ChatSession) -> Value {
    json!({
        "username": session.username(),
        "messages": session.messages(),
        "deep_search": session.deep_search(),
        "can_resume": session.can_resume(),
        "has_table": session.last_table().is_some(),
        "categories": CATEGORY_FILTERS,
    })
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

/// Inner health check: probes SQLite and returns (status_code, json_body).
pub async fn health_inner(pool: &SqlitePool) -> (StatusCode, Value) {
    match advisor_core::db::health_check(pool).await {
        Ok(v) => (
            StatusCode::OK,
            json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "sqlite": v,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({
                "status": "unhealthy",
                "error": e.to_string(),
            }),
        ),
    }
}

/// Inner version: returns version info (pure, no IO).
pub fn version_inner() -> Value {
    json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "advisor/1",
    })
}

pub async fn register_inner(state: &HttpState, req: CredentialsRequest) -> (StatusCode, Value) {
    if req.username.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_body("username field is required"),
        );
    }

    let mut auth_state = AuthState::default();
    auth_state.go_to_register();

    match state
        .auth
        .register(&mut auth_state, &req.username, &req.password)
        .await
    {
        Ok(RegisterOutcome::Registered) => (
            StatusCode::CREATED,
            json!({
                "registered": true,
                "message": "Registered successfully! Please log in.",
                "page": auth_state.page,
            }),
        ),
        Ok(RegisterOutcome::AlreadyExists) => (
            StatusCode::CONFLICT,
            json!({
                "error": "Username already exists",
                "status": "error",
                "page": auth_state.page,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Registration failed");
            (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string()))
        }
    }
}

pub async fn login_inner(state: &HttpState, req: CredentialsRequest) -> (StatusCode, Value) {
    let mut auth_state = AuthState::default();

    match state
        .auth
        .login(&mut auth_state, &req.username, &req.password)
        .await
    {
        Ok(LoginOutcome::LoggedIn) => {
            let session = ChatSession::new(
                req.username.clone(),
                state.backend.clone(),
                state.settings,
            );
            let mut body = session_view(&session);
            let token = state.sessions.insert(session).await;
            if let Some(obj) = body.as_object_mut() {
                obj.insert("token".to_string(), json!(token));
                obj.insert("page".to_string(), json!(auth_state.page));
                obj.insert("message".to_string(), json!("Logged in successfully!"));
            }
            (StatusCode::OK, body)
        }
        Ok(LoginOutcome::InvalidCredentials) => (
            StatusCode::UNAUTHORIZED,
            json!({
                "error": "Invalid username or password",
                "status": "error",
                "page": auth_state.page,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Login failed");
            (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string()))
        }
    }
}

pub async fn logout_inner(state: &HttpState, token: Option<Uuid>) -> (StatusCode, Value) {
    let Some(token) = token else {
        return unauthorized();
    };
    let Some(session) = state.sessions.remove(&token).await else {
        return unauthorized();
    };

    let mut session = session.lock().await;
    let farewell = session.logout();
    (
        StatusCode::OK,
        json!({
            "message": farewell.content,
            "page": advisor_core::Page::Login,
            "messages": [farewell],
        }),
    )
}

pub async fn chat_view_inner(state: &HttpState, token: Option<Uuid>) -> (StatusCode, Value) {
    let Some(session) = lookup(state, token).await else {
        return unauthorized();
    };
    let session = session.lock().await;
    (StatusCode::OK, session_view(&session))
}

pub async fn submit_inner(
    state: &HttpState,
    token: Option<Uuid>,
    req: SubmitRequest,
) -> (StatusCode, Value) {
    let prompt = match req.prompt {
        Some(p) if !p.trim().is_empty() => p,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                error_body("prompt field is required"),
            );
        }
    };

    let Some(session) = lookup(state, token).await else {
        return unauthorized();
    };

    let mut session = session.lock().await;
    let outcome = session.submit(&prompt).await;

    let kind = match &outcome {
        TurnOutcome::Replied(_) => "replied",
        TurnOutcome::NetworkError { .. } => "network_error",
        TurnOutcome::Failed { .. } => "error",
    };

    (
        StatusCode::OK,
        json!({
            "outcome": kind,
            "reply": outcome.reply(),
            "notice": outcome.notice(),
            "has_table": session.last_table().is_some(),
        }),
    )
}

pub async fn session_action_inner(
    state: &HttpState,
    token: Option<Uuid>,
    action: SessionAction,
) -> (StatusCode, Value) {
    let Some(session) = lookup(state, token).await else {
        return unauthorized();
    };

    let mut session = session.lock().await;
    let mut resumed = None;
    match action {
        SessionAction::NewChat => session.new_chat(),
        SessionAction::ClearHistory => session.clear_history(),
        SessionAction::Resume => resumed = Some(session.resume_chat()),
    }
    tracing::debug!(username = %session.username(), action = ?action, "Session action applied");

    let mut body = session_view(&session);
    if let (Some(r), Some(obj)) = (resumed, body.as_object_mut()) {
        obj.insert("resumed".to_string(), json!(r));
    }
    (StatusCode::OK, body)
}

pub async fn deep_search_inner(
    state: &HttpState,
    token: Option<Uuid>,
    req: DeepSearchRequest,
) -> (StatusCode, Value) {
    let Some(session) = lookup(state, token).await else {
        return unauthorized();
    };
    let mut session = session.lock().await;
    session.set_deep_search(req.enabled);
    (StatusCode::OK, session_view(&session))
}

/// Inner export: CSV of the last table, optionally filtered by category.
pub async fn export_inner(
    state: &HttpState,
    token: Option<Uuid>,
    query: ExportQuery,
) -> std::result::Result<String, (StatusCode, Value)> {
    let Some(session) = lookup(state, token).await else {
        return Err(unauthorized());
    };
    let session = session.lock().await;

    let Some(table) = session.last_table() else {
        return Err((
            StatusCode::NOT_FOUND,
            error_body("no recommendations to export"),
        ));
    };

    let table = match query.category.as_deref() {
        Some(category) => table.filter_by_category(category),
        None => table.clone(),
    };

    table_to_csv(&table).map_err(|e| {
        tracing::error!(error = %e, "CSV export failed");
        (StatusCode::INTERNAL_SERVER_ERROR, error_body(e.to_string()))
    })
}

// ============================================================================
// Axum handler wrappers (thin: delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(state.pool()).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn register_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<CredentialsRequest>,
) -> impl IntoResponse {
    let (status, body) = register_inner(&state, req).await;
    (status, Json(body))
}

pub async fn login_handler(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<CredentialsRequest>,
) -> impl IntoResponse {
    let (status, body) = login_inner(&state, req).await;
    (status, Json(body))
}

pub async fn logout_handler(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let (status, body) = logout_inner(&state, bearer_token(&headers)).await;
    (status, Json(body))
}

pub async fn chat_view_handler(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let (status, body) = chat_view_inner(&state, bearer_token(&headers)).await;
    (status, Json(body))
}

pub async fn submit_handler(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    Json(req): Json<SubmitRequest>,
) -> impl IntoResponse {
    let (status, body) = submit_inner(&state, bearer_token(&headers), req).await;
    (status, Json(body))
}

pub async fn new_chat_handler(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let (status, body) =
        session_action_inner(&state, bearer_token(&headers), SessionAction::NewChat).await;
    (status, Json(body))
}

pub async fn resume_chat_handler(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let (status, body) =
        session_action_inner(&state, bearer_token(&headers), SessionAction::Resume).await;
    (status, Json(body))
}

pub async fn clear_history_handler(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let (status, body) =
        session_action_inner(&state, bearer_token(&headers), SessionAction::ClearHistory).await;
    (status, Json(body))
}

pub async fn deep_search_handler(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    Json(req): Json<DeepSearchRequest>,
) -> impl IntoResponse {
    let (status, body) = deep_search_inner(&state, bearer_token(&headers), req).await;
    (status, Json(body))
}

pub async fn export_handler(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    Query(query): Query<ExportQuery>,
) -> Response {
    match export_inner(&state, bearer_token(&headers), query).await {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
                ),
            ],
            csv,
        )
            .into_response(),
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

// ============================================================================
// Unit Tests: call inner functions directly
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::config::AuthConfig;
    use advisor_core::{db, ChatMessage, CompletionError, CredentialStore};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns the same reply for every turn and counts calls.
    struct FixedBackend {
        reply: Result<String, u16>,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl ChatBackend for FixedBackend {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, CompletionError> {
            *self.calls.lock().unwrap() += 1;
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(code) => Err(CompletionError::Api {
                    code: *code,
                    message: "upstream failure".to_string(),
                }),
            }
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    const TABLE_REPLY: &str = "Try these:\n| Category | Recommendation | Impact |\n|---|---|---|\n| Clothing | Choose Tencel | High |\n| Care | Wash cold | Medium |\nEnjoy!";

    async fn make_state(reply: Result<String, u16>) -> HttpState {
        let pool = db::create_memory_pool().await.unwrap();
        db::init_schema(&pool).await.unwrap();
        let auth = AuthConfig {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        };
        let store = CredentialStore::new(pool, &auth).unwrap();
        let backend = Arc::new(FixedBackend {
            reply,
            calls: Mutex::new(0),
        });
        HttpState::new(AuthService::new(store), backend, SessionSettings::immediate())
    }

    fn creds(username: &str, password: &str) -> CredentialsRequest {
        CredentialsRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    async fn logged_in(state: &HttpState) -> Uuid {
        register_inner(state, creds("aadi", "pw")).await;
        let (status, body) = login_inner(state, creds("aadi", "pw")).await;
        assert_eq!(status, StatusCode::OK);
        Uuid::parse_str(body["token"].as_str().unwrap()).unwrap()
    }

    #[test]
    fn test_version_inner_pure() {
        let v = version_inner();
        assert!(v["version"].is_string(), "version must be string");
        assert_eq!(v["protocol"], "advisor/1");
    }

    #[test]
    fn test_bearer_token_parsing() {
        let token = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());
        assert_eq!(bearer_token(&headers), Some(token));

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer not-a-uuid".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn test_health_inner_ok() {
        let state = make_state(Ok("hi".into())).await;
        let (status, body) = health_inner(state.pool()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body["sqlite"].is_string());
    }

    #[tokio::test]
    async fn test_register_duplicate_returns_conflict() {
        let state = make_state(Ok("hi".into())).await;

        let (status, body) = register_inner(&state, creds("aadi", "pw")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["page"], "login");

        let (status, body) = register_inner(&state, creds("aadi", "pw2")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Username already exists");
        assert_eq!(body["page"], "register");
    }

    #[tokio::test]
    async fn test_register_blank_username_rejected() {
        let state = make_state(Ok("hi".into())).await;
        let (status, _) = register_inner(&state, creds("   ", "pw")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_unauthorized() {
        let state = make_state(Ok("hi".into())).await;
        register_inner(&state, creds("aadi", "pw")).await;

        let (status, body) = login_inner(&state, creds("aadi", "nope")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid username or password");
        assert!(state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_login_opens_session_with_welcome() {
        let state = make_state(Ok("hi".into())).await;
        register_inner(&state, creds("aadi", "pw")).await;

        let (status, body) = login_inner(&state, creds("aadi", "pw")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], "main");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert!(body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .starts_with("Welcome, aadi!"));
        assert_eq!(body["categories"][0], "All");
        assert_eq!(state.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn test_submit_returns_reply_and_table() {
        let state = make_state(Ok(TABLE_REPLY.into())).await;
        let token = logged_in(&state).await;

        let req = SubmitRequest {
            prompt: Some("What should I buy?".into()),
        };
        let (status, body) = submit_inner(&state, Some(token), req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "replied");
        assert_eq!(body["reply"]["content"], "Try these:\nEnjoy!");
        assert_eq!(body["reply"]["table"].as_array().unwrap().len(), 2);
        assert!(body["notice"].is_null());
        assert_eq!(body["has_table"], true);
    }

    #[tokio::test]
    async fn test_submit_blank_prompt_is_bad_request() {
        let state = make_state(Ok("hi".into())).await;
        let token = logged_in(&state).await;

        let req = SubmitRequest {
            prompt: Some("  ".into()),
        };
        let (status, _) = submit_inner(&state, Some(token), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, view) = chat_view_inner(&state, Some(token)).await;
        assert_eq!(view["messages"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_network_error_is_reported_not_raised() {
        let state = make_state(Err(503)).await;
        let token = logged_in(&state).await;

        let req = SubmitRequest {
            prompt: Some("hello".into()),
        };
        let (status, body) = submit_inner(&state, Some(token), req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "network_error");
        assert_eq!(
            body["reply"]["content"],
            "I'm having trouble connecting. Please try again later."
        );
        assert!(body["notice"].as_str().unwrap().starts_with("Network error"));
    }

    #[tokio::test]
    async fn test_chat_endpoints_require_token() {
        let state = make_state(Ok("hi".into())).await;
        let (status, _) = chat_view_inner(&state, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = chat_view_inner(&state, Some(Uuid::new_v4())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = session_action_inner(&state, None, SessionAction::NewChat).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_new_chat_and_resume_round_trip() {
        let state = make_state(Ok("plain answer".into())).await;
        let token = logged_in(&state).await;
        submit_inner(
            &state,
            Some(token),
            SubmitRequest {
                prompt: Some("hi".into()),
            },
        )
        .await;
        let (_, before) = chat_view_inner(&state, Some(token)).await;

        let (_, after_new) = session_action_inner(&state, Some(token), SessionAction::NewChat).await;
        assert_eq!(after_new["messages"].as_array().unwrap().len(), 1);
        assert_eq!(after_new["can_resume"], true);

        let (_, resumed) = session_action_inner(&state, Some(token), SessionAction::Resume).await;
        assert_eq!(resumed["resumed"], true);
        assert_eq!(resumed["messages"], before["messages"]);

        let (_, again) = session_action_inner(&state, Some(token), SessionAction::Resume).await;
        assert_eq!(again["resumed"], false);
        assert_eq!(again["messages"], before["messages"]);
    }

    #[tokio::test]
    async fn test_deep_search_toggle() {
        let state = make_state(Ok("hi".into())).await;
        let token = logged_in(&state).await;

        let (_, body) =
            deep_search_inner(&state, Some(token), DeepSearchRequest { enabled: true }).await;
        assert_eq!(body["deep_search"], true);

        let (_, body) =
            deep_search_inner(&state, Some(token), DeepSearchRequest { enabled: false }).await;
        assert_eq!(body["deep_search"], false);
    }

    #[tokio::test]
    async fn test_export_without_table_is_not_found() {
        let state = make_state(Ok("no table here".into())).await;
        let token = logged_in(&state).await;

        let err = export_inner(&state, Some(token), ExportQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_export_filters_by_category() {
        let state = make_state(Ok(TABLE_REPLY.into())).await;
        let token = logged_in(&state).await;
        submit_inner(
            &state,
            Some(token),
            SubmitRequest {
                prompt: Some("advice".into()),
            },
        )
        .await;

        let all = export_inner(&state, Some(token), ExportQuery::default())
            .await
            .unwrap();
        assert_eq!(
            all,
            "Category,Recommendation,Impact\nClothing,Choose Tencel,High\nCare,Wash cold,Medium\n"
        );

        let care = export_inner(
            &state,
            Some(token),
            ExportQuery {
                category: Some("care".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(care, "Category,Recommendation,Impact\nCare,Wash cold,Medium\n");
    }

    #[tokio::test]
    async fn test_logout_removes_session() {
        let state = make_state(Ok("hi".into())).await;
        let token = logged_in(&state).await;

        let (status, body) = logout_inner(&state, Some(token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["page"], "login");
        assert_eq!(
            body["messages"][0]["content"],
            "You have logged out. Please log in to continue! 🌿"
        );

        let (status, _) = chat_view_inner(&state, Some(token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = logout_inner(&state, Some(token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
