use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use innkeep_auth::{Permission, Role, RoleAuditEntry};
use innkeep_core::UserId;
use innkeep_infra::{SortOrder, UserQuery, UserSortField};

use crate::app::errors::ApiError;

/// Look-back used by `GET /roles/audit` when no selector is given.
pub const DEFAULT_AUDIT_DAYS: u32 = 30;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    pub role: String,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    pub current_role: String,
    pub new_role: String,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateAssignmentRequest {
    pub target_role: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ListUsersParams {
    pub fn into_query(self) -> Result<UserQuery, ApiError> {
        let defaults = UserQuery::default();
        let query = UserQuery {
            page: parse_opt("page", self.page)?.unwrap_or(defaults.page),
            limit: parse_opt("limit", self.limit)?.unwrap_or(defaults.limit),
            sort_by: parse_opt::<UserSortField>("sortBy", self.sort_by)?.unwrap_or(defaults.sort_by),
            sort_order: parse_opt::<SortOrder>("sortOrder", self.sort_order)?.unwrap_or(defaults.sort_order),
        };
        query.validate().map_err(|e| ApiError::validation(e.to_string()))?;
        Ok(query)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditParams {
    pub user_id: Option<String>,
    pub actor_id: Option<String>,
    pub role: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub days: Option<String>,
}

/// Which slice of the audit trail a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditSelector {
    User(UserId),
    Actor(UserId),
    Role(Role),
    Between(DateTime<Utc>, DateTime<Utc>),
    Recent(u32),
}

impl AuditParams {
    /// At most one selector may be given; none means the last
    /// [`DEFAULT_AUDIT_DAYS`] days.
    pub fn into_selector(self) -> Result<AuditSelector, ApiError> {
        let given = [
            self.user_id.is_some(),
            self.actor_id.is_some(),
            self.role.is_some(),
            self.from.is_some() || self.to.is_some(),
            self.days.is_some(),
        ]
        .into_iter()
        .filter(|g| *g)
        .count();

        if given > 1 {
            return Err(ApiError::validation(
                "use only one of userId, actorId, role, from/to or days",
            ));
        }

        if let Some(user_id) = parse_opt("userId", self.user_id)? {
            return Ok(AuditSelector::User(user_id));
        }
        if let Some(actor_id) = parse_opt("actorId", self.actor_id)? {
            return Ok(AuditSelector::Actor(actor_id));
        }
        if let Some(role) = parse_opt("role", self.role)? {
            return Ok(AuditSelector::Role(role));
        }
        match (parse_opt("from", self.from)?, parse_opt("to", self.to)?) {
            (Some(from), Some(to)) => return Ok(AuditSelector::Between(from, to)),
            (None, None) => {}
            _ => return Err(ApiError::validation("from and to must be given together")),
        }
        Ok(AuditSelector::Recent(
            parse_opt("days", self.days)?.unwrap_or(DEFAULT_AUDIT_DAYS),
        ))
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsResponse {
    pub role: Role,
    pub permissions: &'static [Permission],
    pub can_assign: Vec<Role>,
}

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub count: usize,
    pub entries: Vec<RoleAuditEntry>,
}

impl From<Vec<RoleAuditEntry>> for AuditResponse {
    fn from(entries: Vec<RoleAuditEntry>) -> Self {
        Self {
            count: entries.len(),
            entries,
        }
    }
}

// -------------------------
// Parsing helpers
// -------------------------

pub fn parse_field<T>(field: &str, raw: &str) -> Result<T, ApiError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ApiError::validation(format!("invalid {field}: {e}")))
}

fn parse_opt<T>(field: &str, raw: Option<String>) -> Result<Option<T>, ApiError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.as_deref().map(|r| parse_field(field, r)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_params_default_and_validate() {
        let query = ListUsersParams::default().into_query().unwrap();
        assert_eq!(query, UserQuery::default());

        let query = ListUsersParams {
            page: Some("2".into()),
            limit: Some("25".into()),
            sort_by: Some("email".into()),
            sort_order: Some("asc".into()),
        }
        .into_query()
        .unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.sort_by, UserSortField::Email);
        assert_eq!(query.sort_order, SortOrder::Asc);

        let err = ListUsersParams { limit: Some("0".into()), ..Default::default() }
            .into_query()
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let err = ListUsersParams { page: Some("first".into()), ..Default::default() }
            .into_query()
            .unwrap_err();
        assert!(err.to_string().starts_with("invalid page"));
    }

    #[test]
    fn audit_selector_rules() {
        assert_eq!(
            AuditParams::default().into_selector().unwrap(),
            AuditSelector::Recent(DEFAULT_AUDIT_DAYS)
        );
        assert_eq!(
            AuditParams { role: Some("Staff".into()), ..Default::default() }
                .into_selector()
                .unwrap(),
            AuditSelector::Role(Role::Staff)
        );
        assert!(
            AuditParams { from: Some("2024-01-01T00:00:00Z".into()), ..Default::default() }
                .into_selector()
                .is_err()
        );
        assert!(
            AuditParams {
                role: Some("staff".into()),
                days: Some("7".into()),
                ..Default::default()
            }
            .into_selector()
            .is_err()
        );
    }
}
