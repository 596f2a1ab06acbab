//! Response bodies shared by every HTTP surface.
//!
//! Two shapes are used:
//! - `ApiResponse<T>`: the generic `{success, msg, data}` envelope returned by
//!   endpoints that report an outcome rather than a resource.
//! - `ApiError`: the `{error, message}` body attached to non-2xx responses.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Outcome envelope
// ============================================================================

/// Generic `{success, msg, data}` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub msg: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Successful outcome carrying `data`.
    pub fn ok(msg: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            msg: msg.into(),
            data,
        }
    }

    /// Failed outcome carrying `data`.
    pub fn fail(msg: impl Into<String>, data: T) -> Self {
        Self {
            success: false,
            msg: msg.into(),
            data,
        }
    }
}

impl ApiResponse<String> {
    /// Successful outcome with an empty `data` string.
    pub fn ok_msg(msg: impl Into<String>) -> Self {
        Self::ok(msg, String::new())
    }

    /// Failed outcome with an empty `data` string.
    pub fn fail_msg(msg: impl Into<String>) -> Self {
        Self::fail(msg, String::new())
    }
}

/// Always rendered with HTTP 200; the outcome lives in `success`.
impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

// ============================================================================
// Error body
// ============================================================================

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }
}
