//! Role audit trail entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use innkeep_core::{AuditEntryId, UserId};

use crate::{Role, RoleChanged};

/// Longest free-text reason accepted for a role change, in characters.
pub const MAX_REASON_LEN: usize = 500;

/// Immutable record of one successful role change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAuditEntry {
    pub id: AuditEntryId,
    pub user_id: UserId,
    pub previous_role: Role,
    pub new_role: Role,
    pub changed_by: UserId,
    pub reason: Option<String>,
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl RoleAuditEntry {
    pub fn from_change(change: &RoleChanged) -> Self {
        Self {
            id: AuditEntryId::new(),
            user_id: change.user_id,
            previous_role: change.previous_role,
            new_role: change.new_role,
            changed_by: change.changed_by,
            reason: change.reason.clone(),
            ip_address: change.origin.clone(),
            timestamp: change.occurred_at,
        }
    }
}
