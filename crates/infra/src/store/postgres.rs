//! Postgres-backed user store.
//!
//! ## Optimistic Concurrency
//!
//! `save_role_change` issues a single conditional `UPDATE ... WHERE id = $1 AND
//! version = $4`, additionally requiring the acting user's row to still be at
//! the version read during validation (locked `FOR SHARE` for the statement).
//! Zero affected rows means either the target is gone or another writer bumped
//! one of the two versions first; a follow-up lookup tells the two apart.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;

use innkeep_auth::{Role, RoleChanged, UserRecord};
use innkeep_core::{ExpectedVersion, UserId};

use super::query::{Page, UserQuery};
use super::{RoleChangeVersions, StoreError, UserStore, normalize_email};

fn version_param(expected: ExpectedVersion) -> Option<i64> {
    match expected {
        ExpectedVersion::Any => None,
        ExpectedVersion::Exact(v) => Some(v as i64),
    }
}

const USER_COLUMNS: &str = "id, email, name, role, is_active, created_at, updated_at, version";

#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: Arc<PgPool>,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

#[async_trait::async_trait]
impl UserStore for PostgresUserStore {
    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;

        row.as_ref().map(decode_user).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(normalize_email(email))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;

        row.as_ref().map(decode_user).transpose()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert(&self, user: UserRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, role, is_active, created_at, updated_at, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(*user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.version as i64)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        Ok(())
    }

    #[instrument(
        skip(self, change),
        fields(user_id = %change.user_id, new_role = %change.new_role),
        err
    )]
    async fn save_role_change(
        &self,
        change: &RoleChanged,
        versions: RoleChangeVersions,
    ) -> Result<UserRecord, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET role = $2, updated_at = $3, version = version + 1
            WHERE id = $1
              AND ($4::BIGINT IS NULL OR version = $4)
              AND ($6::BIGINT IS NULL OR EXISTS (
                  SELECT 1 FROM users actor
                  WHERE actor.id = $5 AND actor.version = $6
                  FOR SHARE
              ))
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(*change.user_id.as_uuid())
        .bind(change.new_role.as_str())
        .bind(change.occurred_at)
        .bind(version_param(versions.target))
        .bind(*change.changed_by.as_uuid())
        .bind(version_param(versions.actor))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_role_change", e))?;

        match row {
            Some(row) => decode_user(&row),
            None => match self.get(change.user_id).await? {
                Some(current) => Err(StoreError::Concurrency(format!(
                    "user {} is at version {} (expected {:?}) or actor {} moved past {:?}",
                    change.user_id, current.version, versions.target, change.changed_by, versions.actor
                ))),
                None => Err(StoreError::NotFound),
            },
        }
    }

    #[instrument(skip(self, query), fields(role = %role), err)]
    async fn list_by_role(&self, role: Role, query: &UserQuery) -> Result<Page<UserRecord>, StoreError> {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM users WHERE role = $1")
            .bind(role.as_str())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_users_by_role", e))?
            .try_get("total")
            .map_err(|e| map_sqlx_error("count_users_by_role", e))?;

        // Sort column and direction come from closed enums, never from raw input.
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = $1 ORDER BY {} {}, id {} LIMIT $2 OFFSET $3",
            query.sort_by.order_expr(),
            query.sort_order.sql(),
            query.sort_order.sql(),
        );

        let rows = sqlx::query(&sql)
            .bind(role.as_str())
            .bind(i64::from(query.limit))
            .bind(query.offset() as i64)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users_by_role", e))?;

        let items = rows
            .iter()
            .map(decode_user)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total.max(0) as u64, query))
    }

    #[instrument(skip(self), err)]
    async fn count_by_role(&self) -> Result<Vec<(Role, u64)>, StoreError> {
        let rows = sqlx::query("SELECT role, COUNT(*) AS total FROM users GROUP BY role")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_by_role", e))?;

        let mut counts: Vec<(Role, u64)> = Role::ALL.into_iter().map(|r| (r, 0)).collect();
        for row in rows {
            let role: String = row.try_get("role").map_err(|e| map_sqlx_error("count_by_role", e))?;
            let total: i64 = row.try_get("total").map_err(|e| map_sqlx_error("count_by_role", e))?;
            let role: Role = role
                .parse()
                .map_err(|e| StoreError::Backend(format!("stored role: {e}")))?;
            if let Some(slot) = counts.iter_mut().find(|(r, _)| *r == role) {
                slot.1 = total.max(0) as u64;
            }
        }
        Ok(counts)
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => StoreError::Duplicate(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

// SQLx row types

fn decode_user(row: &sqlx::postgres::PgRow) -> Result<UserRecord, StoreError> {
    UserRow::decode(row)?.try_into()
}

#[derive(Debug)]
struct UserRow {
    id: uuid::Uuid,
    email: String,
    name: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl UserRow {
    fn decode(row: &sqlx::postgres::PgRow) -> Result<Self, StoreError> {
        let get = |e: sqlx::Error| StoreError::Backend(format!("failed to decode user row: {e}"));
        Ok(UserRow {
            id: row.try_get("id").map_err(get)?,
            email: row.try_get("email").map_err(get)?,
            name: row.try_get("name").map_err(get)?,
            role: row.try_get("role").map_err(get)?,
            is_active: row.try_get("is_active").map_err(get)?,
            created_at: row.try_get("created_at").map_err(get)?,
            updated_at: row.try_get("updated_at").map_err(get)?,
            version: row.try_get("version").map_err(get)?,
        })
    }
}

impl TryFrom<UserRow> for UserRecord {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|e| StoreError::Backend(format!("user {}: {e}", row.id)))?;

        Ok(UserRecord {
            id: UserId::from_uuid(row.id),
            email: row.email,
            name: row.name,
            role,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            version: row.version.max(0) as u64,
        })
    }
}
