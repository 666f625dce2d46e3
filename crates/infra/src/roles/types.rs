use chrono::{DateTime, Utc};
use serde::Serialize;

use innkeep_auth::{Role, UserRecord, split_display_name};
use innkeep_core::UserId;

/// Assign a role without asserting the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignRole {
    pub target: UserId,
    pub actor: UserId,
    pub new_role: Role,
    pub reason: Option<String>,
    /// Client address of the request, recorded in the audit trail.
    pub origin: Option<String>,
}

/// Change a role, asserting what the caller believes the current role is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRole {
    pub target: UserId,
    pub actor: UserId,
    pub current_role: Role,
    pub new_role: Role,
    pub reason: Option<String>,
    pub origin: Option<String>,
}

/// Public view of a user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserSummary {
    fn from(record: &UserRecord) -> Self {
        let (first_name, last_name) = split_display_name(&record.name);
        Self {
            id: record.id,
            email: record.email.clone(),
            first_name,
            last_name,
            role: record.role,
            is_active: record.is_active,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<UserRecord> for UserSummary {
    fn from(record: UserRecord) -> Self {
        Self::from(&record)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleChangeOutcome {
    pub user: UserSummary,
    pub previous_role: Role,
    pub new_role: Role,
}

/// Dry-run answer for "may this actor hand out that role?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentCheck {
    pub is_valid: bool,
    pub can_assign: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleCount {
    pub role: Role,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleStatistics {
    pub total_users: u64,
    pub by_role: Vec<RoleCount>,
}
