//! Append-only audit trail of role changes.
//!
//! There is deliberately no update or delete on [`AuditLog`]; entries are
//! written once by the role assignment flow and only ever read afterwards.

pub mod in_memory;
pub mod postgres;

use chrono::{DateTime, Duration, Utc};

use innkeep_auth::{Role, RoleAuditEntry};
use innkeep_core::UserId;

use crate::store::StoreError;

pub use in_memory::InMemoryAuditLog;
pub use postgres::PostgresAuditLog;

/// Selection of audit entries. Results are always newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditFilter {
    /// Entries whose subject is the user.
    ByUser(UserId),
    /// Entries performed by the actor.
    ByActor(UserId),
    /// Entries whose new role equals the role.
    ByRole(Role),
    /// Inclusive on both ends.
    Between { from: DateTime<Utc>, to: DateTime<Utc> },
    Since(DateTime<Utc>),
}

impl AuditFilter {
    pub fn matches(&self, entry: &RoleAuditEntry) -> bool {
        match *self {
            AuditFilter::ByUser(user_id) => entry.user_id == user_id,
            AuditFilter::ByActor(actor_id) => entry.changed_by == actor_id,
            AuditFilter::ByRole(role) => entry.new_role == role,
            AuditFilter::Between { from, to } => entry.timestamp >= from && entry.timestamp <= to,
            AuditFilter::Since(since) => entry.timestamp >= since,
        }
    }
}

#[async_trait::async_trait]
pub trait AuditLog: Send + Sync {
    /// Durable once this returns `Ok`.
    async fn append(&self, entry: RoleAuditEntry) -> Result<(), StoreError>;

    async fn query(&self, filter: AuditFilter) -> Result<Vec<RoleAuditEntry>, StoreError>;

    async fn by_user(&self, user_id: UserId) -> Result<Vec<RoleAuditEntry>, StoreError> {
        self.query(AuditFilter::ByUser(user_id)).await
    }

    async fn by_actor(&self, actor_id: UserId) -> Result<Vec<RoleAuditEntry>, StoreError> {
        self.query(AuditFilter::ByActor(actor_id)).await
    }

    async fn by_role(&self, role: Role) -> Result<Vec<RoleAuditEntry>, StoreError> {
        self.query(AuditFilter::ByRole(role)).await
    }

    async fn by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<RoleAuditEntry>, StoreError> {
        self.query(AuditFilter::Between { from, to }).await
    }

    /// Entries from the last `days` days as seen from `now`.
    async fn recent(&self, days: u32, now: DateTime<Utc>) -> Result<Vec<RoleAuditEntry>, StoreError> {
        self.query(AuditFilter::Since(now - Duration::days(i64::from(days))))
            .await
    }
}
