//! Persisted user record and the pure decision logic for role changes.
//!
//! The decision (`decide_role_change`) performs every validation step and
//! returns a `RoleChanged` fact without touching state. Only `apply` mutates,
//! so a rejected change can never leave a partially updated record behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use innkeep_core::{AggregateRoot, UserId};

use crate::audit::MAX_REASON_LEN;
use crate::{Role, hierarchy};

// ─────────────────────────────────────────────────────────────────────────────
// Record
// ─────────────────────────────────────────────────────────────────────────────

/// A user account as stored.
///
/// # Invariants
/// - Exactly one role at all times.
/// - `version` increases by one on every persisted mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    /// Single display name; split into first/last at read time.
    pub name: String,
    pub role: Role,
    /// Email verified and account enabled.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl UserRecord {
    pub fn new(
        id: UserId,
        email: impl Into<String>,
        name: impl Into<String>,
        role: Role,
        is_active: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email: email.into().trim().to_lowercase(),
            name: name.into().trim().to_string(),
            role,
            is_active,
            created_at,
            updated_at: created_at,
            version: 1,
        }
    }

    /// Evolve in-memory state from a decided role change.
    pub fn apply(&mut self, event: &RoleChanged) {
        self.role = event.new_role;
        self.updated_at = event.occurred_at;
        self.version += 1;
    }
}

impl AggregateRoot for UserRecord {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command / Event
// ─────────────────────────────────────────────────────────────────────────────

/// Request to move `target` onto `new_role`, issued by `actor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRole {
    pub target: UserId,
    pub actor: UserId,
    pub new_role: Role,
    /// Role the caller believes the target currently holds (update entry point only).
    pub expected_current: Option<Role>,
    pub reason: Option<String>,
    pub origin: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl ChangeRole {
    /// Input checks that do not need any stored state.
    pub fn validate_input(&self) -> Result<(), RoleChangeError> {
        if let Some(reason) = &self.reason {
            let len = reason.chars().count();
            if len > MAX_REASON_LEN {
                return Err(RoleChangeError::ReasonTooLong { len });
            }
        }
        Ok(())
    }
}

/// A validated role change, ready to be persisted and audited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleChanged {
    pub user_id: UserId,
    pub previous_role: Role,
    pub new_role: Role,
    pub changed_by: UserId,
    pub reason: Option<String>,
    pub origin: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleChangeError {
    #[error("users cannot modify their own role")]
    SelfModification,

    #[error("user already has the {0} role")]
    AlreadyAssigned(Role),

    #[error("current role mismatch: request says {asserted}, user has {actual}")]
    StaleCurrentRole { asserted: Role, actual: Role },

    #[error("{reason}")]
    Denied { reason: &'static str },

    #[error("reason must be at most 500 characters (got {len})")]
    ReasonTooLong { len: usize },
}

impl RoleChangeError {
    pub fn code(&self) -> &'static str {
        match self {
            RoleChangeError::SelfModification => "SELF_ROLE_MODIFICATION",
            RoleChangeError::AlreadyAssigned(_) => "ROLE_ALREADY_ASSIGNED",
            RoleChangeError::StaleCurrentRole { .. } => "VALIDATION_ERROR",
            RoleChangeError::Denied { .. } => "ROLE_ASSIGNMENT_DENIED",
            RoleChangeError::ReasonTooLong { .. } => "VALIDATION_ERROR",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decision
// ─────────────────────────────────────────────────────────────────────────────

/// Decide whether `actor` may apply `cmd` to `target`.
///
/// Checks run in a fixed order and the first failure wins:
/// self-modification, no-op, stale current role, hierarchy.
pub fn decide_role_change(
    target: &UserRecord,
    actor: &UserRecord,
    cmd: &ChangeRole,
) -> Result<RoleChanged, RoleChangeError> {
    cmd.validate_input()?;

    if actor.id == target.id {
        return Err(RoleChangeError::SelfModification);
    }

    if target.role == cmd.new_role {
        return Err(RoleChangeError::AlreadyAssigned(cmd.new_role));
    }

    if let Some(asserted) = cmd.expected_current {
        if asserted != target.role {
            return Err(RoleChangeError::StaleCurrentRole {
                asserted,
                actual: target.role,
            });
        }
    }

    if let Some(reason) = hierarchy::assignment_denial_reason(actor.role, cmd.new_role) {
        return Err(RoleChangeError::Denied { reason });
    }

    Ok(RoleChanged {
        user_id: target.id,
        previous_role: target.role,
        new_role: cmd.new_role,
        changed_by: actor.id,
        reason: cmd.reason.clone(),
        origin: cmd.origin.clone(),
        occurred_at: cmd.occurred_at,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn user(role: Role) -> UserRecord {
        UserRecord::new(UserId::new(), "x@example.com", "Test User", role, true, now())
    }

    fn change(target: &UserRecord, actor: &UserRecord, new_role: Role) -> ChangeRole {
        ChangeRole {
            target: target.id,
            actor: actor.id,
            new_role,
            expected_current: None,
            reason: None,
            origin: None,
            occurred_at: now(),
        }
    }

    #[test]
    fn admin_promotes_user_to_staff() {
        let admin = user(Role::Admin);
        let target = user(Role::User);
        let mut cmd = change(&target, &admin, Role::Staff);
        cmd.reason = Some("promotion".to_string());

        let event = decide_role_change(&target, &admin, &cmd).unwrap();
        assert_eq!(event.previous_role, Role::User);
        assert_eq!(event.new_role, Role::Staff);
        assert_eq!(event.changed_by, admin.id);
        assert_eq!(event.reason.as_deref(), Some("promotion"));
    }

    #[test]
    fn self_modification_rejected_for_every_role() {
        for held in Role::ALL {
            for wanted in Role::ALL {
                let me = user(held);
                let cmd = change(&me, &me, wanted);
                assert_eq!(
                    decide_role_change(&me, &me, &cmd).unwrap_err(),
                    RoleChangeError::SelfModification,
                    "{held} -> {wanted} on self"
                );
            }
        }
    }

    #[test]
    fn no_op_change_is_rejected_before_hierarchy() {
        // A plain user asking for a role the target already has hears about
        // the no-op, not about lacking rights.
        let actor = user(Role::User);
        let target = user(Role::Staff);
        let cmd = change(&target, &actor, Role::Staff);

        assert_eq!(
            decide_role_change(&target, &actor, &cmd).unwrap_err(),
            RoleChangeError::AlreadyAssigned(Role::Staff)
        );
    }

    #[test]
    fn stale_current_role_is_a_validation_error() {
        let admin = user(Role::Admin);
        let target = user(Role::Staff);
        let mut cmd = change(&target, &admin, Role::Admin);
        cmd.expected_current = Some(Role::User);

        let err = decide_role_change(&target, &admin, &cmd).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(matches!(err, RoleChangeError::StaleCurrentRole { asserted: Role::User, actual: Role::Staff }));
    }

    #[test]
    fn staff_cannot_promote_to_staff_but_can_demote() {
        let staff = user(Role::Staff);
        let guest = user(Role::User);
        let cmd = change(&guest, &staff, Role::Staff);
        let err = decide_role_change(&guest, &staff, &cmd).unwrap_err();
        assert_eq!(err.code(), "ROLE_ASSIGNMENT_DENIED");
        assert_eq!(err.to_string(), "Only administrators can assign the staff role");

        let other_staff = user(Role::Staff);
        let cmd = change(&other_staff, &staff, Role::User);
        assert!(decide_role_change(&other_staff, &staff, &cmd).is_ok());
    }

    #[test]
    fn overlong_reason_is_rejected() {
        let admin = user(Role::Admin);
        let target = user(Role::User);
        let mut cmd = change(&target, &admin, Role::Staff);
        cmd.reason = Some("x".repeat(MAX_REASON_LEN + 1));

        assert_eq!(
            decide_role_change(&target, &admin, &cmd).unwrap_err(),
            RoleChangeError::ReasonTooLong { len: MAX_REASON_LEN + 1 }
        );
    }

    #[test]
    fn apply_bumps_version_and_role() {
        let admin = user(Role::Admin);
        let mut target = user(Role::User);
        let cmd = change(&target, &admin, Role::Staff);
        let event = decide_role_change(&target, &admin, &cmd).unwrap();

        target.apply(&event);
        assert_eq!(target.role, Role::Staff);
        assert_eq!(target.version, 2);
    }
}
