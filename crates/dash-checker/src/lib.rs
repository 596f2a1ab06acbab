//! In-browser Python checker backend.
//!
//! A submission travels through:
//!
//! ```text
//! [browser] ──POST /check_code──► [SessionStore] ──temp file──► [pylint]
//!                                                                  │ stdout
//!                                                                  ▼
//!                                  JSON ◄── [format_errors (rayon)]
//!
//! [browser] ──POST /run_code────► [RunThrottle] ──► [python <temp file>] ──► JSON string
//! ```
//!
//! ## Modules
//!
//! - `session`: per-user state and the session-scoped temp file
//! - `analyzer`: pylint invocation
//! - `format`: pylint text output → structured error records
//! - `codes`: static message-code → description table
//! - `runner`: rate limiter and script execution
//! - `http`: axum routes and the login gate

pub mod analyzer;
pub mod codes;
pub mod error;
pub mod format;
pub mod http;
pub mod runner;
pub mod session;

pub use analyzer::{AnalyzerConfig, AnalyzerError, AnalyzerOutput, evaluate, run_analyzer};
pub use error::CheckerError;
pub use format::{ErrorRecord, FormatError, FormattedErrors, LinePlatform, format_errors, process_line};
pub use http::{CheckerState, LOGIN_PATH, SharedCheckerState, create_checker_router};
pub use runner::{RunError, RunThrottle, THROTTLE_MESSAGE, ThrottleDecision, execute};
pub use session::{SessionRecord, SessionStore};
