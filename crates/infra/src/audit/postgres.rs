//! Postgres-backed audit log. Insert-only; the table has no update path.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use innkeep_auth::{Role, RoleAuditEntry};
use innkeep_core::{AuditEntryId, UserId};

use super::{AuditFilter, AuditLog};
use crate::store::StoreError;

const AUDIT_COLUMNS: &str =
    "id, user_id, previous_role, new_role, changed_by, reason, ip_address, created_at";

#[derive(Debug, Clone)]
pub struct PostgresAuditLog {
    pool: Arc<PgPool>,
}

impl PostgresAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

#[async_trait::async_trait]
impl AuditLog for PostgresAuditLog {
    #[instrument(skip(self, entry), fields(user_id = %entry.user_id, changed_by = %entry.changed_by), err)]
    async fn append(&self, entry: RoleAuditEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO role_audit_log
                (id, user_id, previous_role, new_role, changed_by, reason, ip_address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(*entry.id.as_uuid())
        .bind(*entry.user_id.as_uuid())
        .bind(entry.previous_role.as_str())
        .bind(entry.new_role.as_str())
        .bind(*entry.changed_by.as_uuid())
        .bind(&entry.reason)
        .bind(&entry.ip_address)
        .bind(entry.timestamp)
        .execute(&*self.pool)
        .await
        .map_err(|e| StoreError::Backend(format!("append audit entry: {e}")))?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn query(&self, filter: AuditFilter) -> Result<Vec<RoleAuditEntry>, StoreError> {
        let base = format!("SELECT {AUDIT_COLUMNS} FROM role_audit_log");
        let order = "ORDER BY created_at DESC, id DESC";

        let rows = match filter {
            AuditFilter::ByUser(user_id) => {
                sqlx::query(&format!("{base} WHERE user_id = $1 {order}"))
                    .bind(*user_id.as_uuid())
                    .fetch_all(&*self.pool)
                    .await
            }
            AuditFilter::ByActor(actor_id) => {
                sqlx::query(&format!("{base} WHERE changed_by = $1 {order}"))
                    .bind(*actor_id.as_uuid())
                    .fetch_all(&*self.pool)
                    .await
            }
            AuditFilter::ByRole(role) => {
                sqlx::query(&format!("{base} WHERE new_role = $1 {order}"))
                    .bind(role.as_str())
                    .fetch_all(&*self.pool)
                    .await
            }
            AuditFilter::Between { from, to } => {
                sqlx::query(&format!("{base} WHERE created_at >= $1 AND created_at <= $2 {order}"))
                    .bind(from)
                    .bind(to)
                    .fetch_all(&*self.pool)
                    .await
            }
            AuditFilter::Since(since) => {
                sqlx::query(&format!("{base} WHERE created_at >= $1 {order}"))
                    .bind(since)
                    .fetch_all(&*self.pool)
                    .await
            }
        }
        .map_err(|e| StoreError::Backend(format!("query audit log: {e}")))?;

        rows.iter().map(decode_entry).collect()
    }
}

fn decode_entry(row: &sqlx::postgres::PgRow) -> Result<RoleAuditEntry, StoreError> {
    let get = |e: sqlx::Error| StoreError::Backend(format!("failed to decode audit row: {e}"));
    let role = |raw: String| -> Result<Role, StoreError> {
        raw.parse::<Role>()
            .map_err(|e| StoreError::Backend(format!("audit row: {e}")))
    };

    let id: uuid::Uuid = row.try_get("id").map_err(get)?;
    let user_id: uuid::Uuid = row.try_get("user_id").map_err(get)?;
    let changed_by: uuid::Uuid = row.try_get("changed_by").map_err(get)?;
    let timestamp: DateTime<Utc> = row.try_get("created_at").map_err(get)?;

    Ok(RoleAuditEntry {
        id: AuditEntryId::from_uuid(id),
        user_id: UserId::from_uuid(user_id),
        previous_role: role(row.try_get("previous_role").map_err(get)?)?,
        new_role: role(row.try_get("new_role").map_err(get)?)?,
        changed_by: UserId::from_uuid(changed_by),
        reason: row.try_get("reason").map_err(get)?,
        ip_address: row.try_get("ip_address").map_err(get)?,
        timestamp,
    })
}
