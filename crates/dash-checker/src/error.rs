//! HTTP-facing error type for the checker routes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dash_common::ApiError;
use thiserror::Error;
use tracing::error;

use crate::analyzer::AnalyzerError;
use crate::runner::RunError;

/// Any failure surfaced by a checker endpoint.
#[derive(Debug, Error)]
pub enum CheckerError {
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl CheckerError {
    /// HTTP status reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            CheckerError::Run(RunError::NoSubmission) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CheckerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status == StatusCode::BAD_REQUEST {
            ApiError::bad_request(self.to_string())
        } else {
            error!(error = %self, "Checker request failed");
            ApiError::internal(self.to_string())
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatError;

    #[test]
    fn test_no_submission_is_bad_request() {
        let error = CheckerError::from(RunError::NoSubmission);
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_analyzer_failures_are_internal() {
        let config = CheckerError::from(AnalyzerError::Configuration("bad".to_string()));
        assert_eq!(config.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(config.to_string().contains("Issue with pylint configuration"));

        let lookup = CheckerError::from(AnalyzerError::from(FormatError::UnknownCode("W9999".to_string())));
        assert_eq!(lookup.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
