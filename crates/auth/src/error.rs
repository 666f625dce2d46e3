//! Authentication failures surfaced to callers of the auth pipeline.

use thiserror::Error;

/// Failure while turning a bearer token into an identity.
///
/// Deliberately coarse: every token-level problem collapses into
/// [`AuthError::InvalidToken`] so callers cannot probe which check failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid or expired access token")]
    InvalidToken,

    #[error("user not found")]
    UserNotFound,

    #[error("email address has not been verified")]
    EmailNotVerified,

    /// Backend failure while resolving the identity. Detail is logged, not returned.
    #[error("internal error")]
    Internal,
}

impl AuthError {
    /// Machine-stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            AuthError::Internal => "INTERNAL_ERROR",
        }
    }
}
