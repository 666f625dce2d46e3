use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use innkeep_auth::{AuthError, GuardError, RoleChangeError};
use innkeep_infra::RoleError;

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Error returned by handlers and middleware; renders as `{"error", "message"}`.
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    Guard(GuardError),
    Role(RoleError),
    /// Malformed path, query or body input.
    Validation(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(AuthError::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Guard(_) => StatusCode::FORBIDDEN,
            ApiError::Role(err) => role_status(err),
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Auth(err) => err.code(),
            ApiError::Guard(err) => err.code(),
            ApiError::Role(err) => err.code(),
            ApiError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

fn role_status(err: &RoleError) -> StatusCode {
    match err {
        RoleError::UserNotFound => StatusCode::NOT_FOUND,
        RoleError::Rejected(RoleChangeError::SelfModification | RoleChangeError::Denied { .. }) => {
            StatusCode::FORBIDDEN
        }
        RoleError::Rejected(_) | RoleError::Validation(_) => StatusCode::BAD_REQUEST,
        RoleError::ConcurrentModification => StatusCode::CONFLICT,
        RoleError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl core::fmt::Display for ApiError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ApiError::Auth(err) => core::fmt::Display::fmt(err, f),
            ApiError::Guard(err) => core::fmt::Display::fmt(err, f),
            ApiError::Role(err) => core::fmt::Display::fmt(err, f),
            ApiError::Validation(msg) => f.write_str(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_error(self.status(), self.code(), self.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<GuardError> for ApiError {
    fn from(err: GuardError) -> Self {
        ApiError::Guard(err)
    }
}

impl From<RoleError> for ApiError {
    fn from(err: RoleError) -> Self {
        ApiError::Role(err)
    }
}
