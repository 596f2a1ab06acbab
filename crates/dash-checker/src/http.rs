//! HTTP endpoints for the code checker.
//!
//! - `POST /check_code` - analyze the form field `text`, return findings
//! - `POST /run_code` - run the last checked submission, return its output
//!
//! Both routes sit behind a login gate and a cookie-backed session layer.

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::post,
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::{MemoryStore, Session, SessionManagerLayer};
use tracing::{debug, info};

use crate::analyzer::{AnalyzerConfig, evaluate};
use crate::error::CheckerError;
use crate::format::FormattedErrors;
use crate::runner::{RunError, RunThrottle, THROTTLE_MESSAGE, ThrottleDecision, execute};
use crate::session::SessionStore;

/// Where unauthenticated requests are sent.
pub const LOGIN_PATH: &str = "/login";

/// Name of the browser cookie carrying the session.
pub const SESSION_COOKIE: &str = "pycheck_session";

/// Key under which the checker's session id is kept in the cookie session.
const SESSION_ID_KEY: &str = "checker_session_id";

// ============================================================================
// State
// ============================================================================

/// Shared state for checker handlers.
#[derive(Debug, Clone)]
pub struct CheckerState {
    pub store: SessionStore,
    pub analyzer: AnalyzerConfig,
    /// Interpreter used to run submissions (e.g. `python3`).
    pub interpreter: String,
    pub throttle: RunThrottle,
    /// Logged-in user; `None` redirects every request to the login page.
    pub current_user: Option<String>,
}

impl CheckerState {
    pub fn new(
        store: SessionStore,
        analyzer: AnalyzerConfig,
        interpreter: impl Into<String>,
        throttle: RunThrottle,
        current_user: Option<String>,
    ) -> Self {
        Self {
            store,
            analyzer,
            interpreter: interpreter.into(),
            throttle,
            current_user,
        }
    }
}

/// Shared reference to CheckerState.
pub type SharedCheckerState = Arc<CheckerState>;

/// Form body of `POST /check_code`.
#[derive(Debug, Deserialize)]
pub struct CheckForm {
    pub text: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /check_code - Analyze a submission.
async fn check_code(
    State(state): State<SharedCheckerState>,
    session: Session,
    Form(form): Form<CheckForm>,
) -> Result<Json<FormattedErrors>, CheckerError> {
    let id = session_id(&session).await?;
    let result = evaluate(&state.store, &state.analyzer, &id, &form.text).await?;

    debug!(
        session = %id,
        findings = result.as_ref().map_or(0, |r| r.iter().flatten().count()),
        "Submission checked"
    );
    Ok(Json(result))
}

/// POST /run_code - Run the last checked submission.
async fn run_code(
    State(state): State<SharedCheckerState>,
    session: Session,
) -> Result<Json<String>, CheckerError> {
    let id = session_id(&session).await?;

    let (decision, script) = state.store.with_session(&id, |record| {
        (state.throttle.check(record, Utc::now()), record.file_path.clone())
    });

    if decision == ThrottleDecision::Throttled {
        info!(session = %id, "Run request throttled");
        return Ok(Json(THROTTLE_MESSAGE.to_string()));
    }

    let script = script.ok_or(RunError::NoSubmission)?;
    let output = execute(&state.interpreter, &script).await?;
    Ok(Json(output))
}

/// Session id stored in the cookie session, issued on first use.
async fn session_id(session: &Session) -> Result<String, CheckerError> {
    if let Some(id) = session.get::<String>(SESSION_ID_KEY).await? {
        return Ok(id);
    }
    let id = SessionStore::new_session_id();
    session.insert(SESSION_ID_KEY, &id).await?;
    Ok(id)
}

/// Redirect to the login page unless a user is logged in.
async fn require_login(
    State(state): State<SharedCheckerState>,
    request: Request,
    next: Next,
) -> Response {
    if state.current_user.is_none() {
        debug!(path = %request.uri().path(), "No user logged in, redirecting");
        return Redirect::to(LOGIN_PATH).into_response();
    }
    next.run(request).await
}

// ============================================================================
// Router Configuration
// ============================================================================

/// Create the checker router with all endpoints.
pub fn create_checker_router(state: SharedCheckerState) -> Router {
    let sessions = SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE)
        .with_secure(false);

    Router::new()
        .route("/check_code", post(check_code))
        .route("/run_code", post(run_code))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login))
        .layer(sessions)
        .with_state(state)
}
