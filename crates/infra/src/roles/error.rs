use thiserror::Error;

use innkeep_auth::RoleChangeError;

use crate::store::StoreError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleError {
    #[error("user not found")]
    UserNotFound,

    /// Rejected by the role-change decision (self change, no-op, hierarchy...).
    #[error(transparent)]
    Rejected(#[from] RoleChangeError),

    #[error("{0}")]
    Validation(String),

    #[error("user was modified concurrently; reload and retry")]
    ConcurrentModification,

    /// Storage failure. Detail is logged where it happens, never returned.
    #[error("internal error")]
    Internal,
}

impl RoleError {
    pub fn code(&self) -> &'static str {
        match self {
            RoleError::UserNotFound => "USER_NOT_FOUND",
            RoleError::Rejected(inner) => inner.code(),
            RoleError::Validation(_) => "VALIDATION_ERROR",
            RoleError::ConcurrentModification => "CONCURRENT_MODIFICATION",
            RoleError::Internal => "INTERNAL_ERROR",
        }
    }
}

impl From<StoreError> for RoleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Concurrency(detail) => {
                tracing::warn!(%detail, "role change lost an optimistic concurrency race");
                RoleError::ConcurrentModification
            }
            StoreError::NotFound => RoleError::UserNotFound,
            other => {
                tracing::error!(error = %other, "user store failure");
                RoleError::Internal
            }
        }
    }
}

impl From<innkeep_core::DomainError> for RoleError {
    fn from(err: innkeep_core::DomainError) -> Self {
        match err {
            innkeep_core::DomainError::Validation(msg) => RoleError::Validation(msg),
            innkeep_core::DomainError::InvalidId(msg) => RoleError::Validation(msg),
            innkeep_core::DomainError::Conflict(_) => RoleError::ConcurrentModification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use innkeep_auth::Role;

    #[test]
    fn codes_pass_through_from_decision() {
        assert_eq!(RoleError::from(RoleChangeError::SelfModification).code(), "SELF_ROLE_MODIFICATION");
        assert_eq!(
            RoleError::from(RoleChangeError::AlreadyAssigned(Role::Staff)).code(),
            "ROLE_ALREADY_ASSIGNED"
        );
    }

    #[test]
    fn store_errors_are_normalized() {
        assert_eq!(
            RoleError::from(StoreError::Concurrency("v2 != v3".into())),
            RoleError::ConcurrentModification
        );
        let internal = RoleError::from(StoreError::Backend("password=hunter2".into()));
        assert_eq!(internal.code(), "INTERNAL_ERROR");
        assert!(!internal.to_string().contains("hunter2"));
    }
}
