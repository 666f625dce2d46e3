//! Request guards: role and permission predicates over the request identity.
//!
//! A guard is a plain value that is evaluated against the (optional) identity
//! attached to a request. Expected rejections are returned as [`GuardError`]
//! values; nothing here panics or performs IO.

use thiserror::Error;

use crate::{IdentityContext, Permission, Role, hierarchy};

/// Role predicate.
///
/// A user holds exactly one role, so [`RoleRequirement::All`] can only pass
/// for a single-element list equal to that role. The variant mirrors the
/// multi-role API surface that callers already use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRequirement {
    Exact(Role),
    Any(Vec<Role>),
    All(Vec<Role>),
}

/// Permission predicate, resolved through the role hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionRequirement {
    One(Permission),
    Any(Vec<Permission>),
    All(Vec<Permission>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    Role(RoleRequirement),
    Permission(PermissionRequirement),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GuardError {
    #[error("user role not found; authenticate before authorization")]
    MissingIdentity,

    #[error("role '{required}' required")]
    RoleRequired { required: Role, held: Role },

    #[error("one of the roles [{}] required", list(.required))]
    InsufficientRole { required: Vec<Role>, held: Role },

    #[error("all of the roles [{}] required", list(.required))]
    MultipleRolesRequired { required: Vec<Role>, held: Role },

    #[error("permission denied; requires one of [{}]", list(.required))]
    PermissionDenied { required: Vec<Permission>, role: Role },

    #[error("missing required permissions [{}]", list(.missing))]
    MultiplePermissionsRequired { missing: Vec<Permission>, role: Role },
}

impl GuardError {
    /// Machine-stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            GuardError::MissingIdentity => "USER_ROLE_NOT_FOUND",
            GuardError::RoleRequired { .. } => "ROLE_REQUIRED",
            GuardError::InsufficientRole { .. } => "INSUFFICIENT_ROLE",
            GuardError::MultipleRolesRequired { .. } => "MULTIPLE_ROLES_REQUIRED",
            GuardError::PermissionDenied { .. } => "PERMISSION_DENIED",
            GuardError::MultiplePermissionsRequired { .. } => "MULTIPLE_PERMISSIONS_REQUIRED",
        }
    }
}

fn list<T: core::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn require_role(role: Role) -> Guard {
    Guard::Role(RoleRequirement::Exact(role))
}

pub fn require_any_role(roles: impl IntoIterator<Item = Role>) -> Guard {
    Guard::Role(RoleRequirement::Any(roles.into_iter().collect()))
}

pub fn require_all_roles(roles: impl IntoIterator<Item = Role>) -> Guard {
    Guard::Role(RoleRequirement::All(roles.into_iter().collect()))
}

pub fn require_permission(permission: Permission) -> Guard {
    Guard::Permission(PermissionRequirement::One(permission))
}

pub fn require_any_permission(permissions: impl IntoIterator<Item = Permission>) -> Guard {
    Guard::Permission(PermissionRequirement::Any(permissions.into_iter().collect()))
}

pub fn require_all_permissions(permissions: impl IntoIterator<Item = Permission>) -> Guard {
    Guard::Permission(PermissionRequirement::All(permissions.into_iter().collect()))
}

impl Guard {
    /// Evaluate against the identity attached to the request, if any.
    ///
    /// Empty requirement lists never pass.
    pub fn check(&self, identity: Option<&IdentityContext>) -> Result<(), GuardError> {
        let identity = identity.ok_or(GuardError::MissingIdentity)?;
        let held = identity.role;

        match self {
            Guard::Role(RoleRequirement::Exact(required)) => {
                if held == *required {
                    Ok(())
                } else {
                    Err(GuardError::RoleRequired { required: *required, held })
                }
            }
            Guard::Role(RoleRequirement::Any(required)) => {
                if required.contains(&held) {
                    Ok(())
                } else {
                    Err(GuardError::InsufficientRole { required: required.clone(), held })
                }
            }
            Guard::Role(RoleRequirement::All(required)) => {
                if !required.is_empty() && required.iter().all(|r| *r == held) {
                    Ok(())
                } else {
                    Err(GuardError::MultipleRolesRequired { required: required.clone(), held })
                }
            }
            Guard::Permission(PermissionRequirement::One(required)) => {
                if hierarchy::has_permission(held, *required) {
                    Ok(())
                } else {
                    Err(GuardError::PermissionDenied { required: vec![*required], role: held })
                }
            }
            Guard::Permission(PermissionRequirement::Any(required)) => {
                if required.iter().any(|p| hierarchy::has_permission(held, *p)) {
                    Ok(())
                } else {
                    Err(GuardError::PermissionDenied { required: required.clone(), role: held })
                }
            }
            Guard::Permission(PermissionRequirement::All(required)) => {
                let missing: Vec<Permission> = required
                    .iter()
                    .copied()
                    .filter(|p| !hierarchy::has_permission(held, *p))
                    .collect();
                if !required.is_empty() && missing.is_empty() {
                    Ok(())
                } else {
                    Err(GuardError::MultiplePermissionsRequired { missing, role: held })
                }
            }
        }
    }
}

/// Ordered guards; the first failure is terminal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardChain(Vec<Guard>);

impl GuardChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, guard: Guard) -> Self {
        self.0.push(guard);
        self
    }

    pub fn check(&self, identity: Option<&IdentityContext>) -> Result<(), GuardError> {
        // Identity is required even when the chain is empty.
        identity.ok_or(GuardError::MissingIdentity)?;
        self.0.iter().try_for_each(|guard| guard.check(identity))
    }
}

impl From<Guard> for GuardChain {
    fn from(guard: Guard) -> Self {
        Self(vec![guard])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use innkeep_core::UserId;
    use proptest::prelude::*;

    fn identity(role: Role) -> IdentityContext {
        IdentityContext {
            user_id: UserId::new(),
            email: "guard@example.com".to_string(),
            first_name: "Guard".to_string(),
            last_name: String::new(),
            is_active: true,
            role,
        }
    }

    #[test]
    fn missing_identity_is_reported_first() {
        let err = require_role(Role::User).check(None).unwrap_err();
        assert_eq!(err.code(), "USER_ROLE_NOT_FOUND");
        assert_eq!(GuardChain::new().check(None).unwrap_err(), GuardError::MissingIdentity);
    }

    #[test]
    fn exact_role_match() {
        assert!(require_role(Role::Staff).check(Some(&identity(Role::Staff))).is_ok());
        let err = require_role(Role::Admin).check(Some(&identity(Role::Staff))).unwrap_err();
        assert_eq!(err.code(), "ROLE_REQUIRED");
        assert_eq!(err.to_string(), "role 'admin' required");
    }

    #[test]
    fn any_role_membership() {
        let guard = require_any_role([Role::Staff, Role::Admin]);
        assert!(guard.check(Some(&identity(Role::Admin))).is_ok());
        let err = guard.check(Some(&identity(Role::User))).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_ROLE");
        assert_eq!(err.to_string(), "one of the roles [staff, admin] required");
    }

    #[test]
    fn all_roles_with_two_distinct_roles_never_passes() {
        let guard = require_all_roles([Role::Staff, Role::Admin]);
        for role in Role::ALL {
            let err = guard.check(Some(&identity(role))).unwrap_err();
            assert_eq!(err.code(), "MULTIPLE_ROLES_REQUIRED");
        }
    }

    #[test]
    fn empty_lists_fail_closed() {
        let admin = identity(Role::Admin);
        assert!(require_any_role([]).check(Some(&admin)).is_err());
        assert!(require_all_roles([]).check(Some(&admin)).is_err());
        assert!(require_any_permission([]).check(Some(&admin)).is_err());
        assert!(require_all_permissions([]).check(Some(&admin)).is_err());
    }

    #[test]
    fn permission_checks_use_the_hierarchy() {
        let staff = identity(Role::Staff);
        assert!(require_permission(Permission::RoomsUpdate).check(Some(&staff)).is_ok());

        let err = require_permission(Permission::AuditRead).check(Some(&staff)).unwrap_err();
        assert_eq!(err.code(), "PERMISSION_DENIED");

        assert!(
            require_any_permission([Permission::AuditRead, Permission::BookingsRead])
                .check(Some(&staff))
                .is_ok()
        );

        let err = require_all_permissions([Permission::UsersRead, Permission::UsersDelete])
            .check(Some(&staff))
            .unwrap_err();
        assert_eq!(err.code(), "MULTIPLE_PERMISSIONS_REQUIRED");
        assert_eq!(
            err,
            GuardError::MultiplePermissionsRequired {
                missing: vec![Permission::UsersDelete],
                role: Role::Staff
            }
        );
    }

    #[test]
    fn chain_stops_at_first_failure() {
        let chain = GuardChain::new()
            .then(require_any_role([Role::Staff, Role::Admin]))
            .then(require_permission(Permission::AuditRead));

        assert!(chain.check(Some(&identity(Role::Admin))).is_ok());
        assert_eq!(
            chain.check(Some(&identity(Role::Staff))).unwrap_err().code(),
            "PERMISSION_DENIED"
        );
        assert_eq!(
            chain.check(Some(&identity(Role::User))).unwrap_err().code(),
            "INSUFFICIENT_ROLE"
        );
    }

    fn any_role() -> impl Strategy<Value = Role> {
        proptest::sample::select(Role::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn all_roles_single_passes_iff_equal(held in any_role(), wanted in any_role()) {
            let outcome = require_all_roles([wanted]).check(Some(&identity(held)));
            prop_assert_eq!(outcome.is_ok(), held == wanted);
        }

        #[test]
        fn admin_passes_every_permission_guard(perms in proptest::sample::subsequence(Permission::ALL.to_vec(), 1..5)) {
            let admin = identity(Role::Admin);
            prop_assert!(require_all_permissions(perms.clone()).check(Some(&admin)).is_ok());
            prop_assert!(require_any_permission(perms).check(Some(&admin)).is_ok());
        }
    }
}
