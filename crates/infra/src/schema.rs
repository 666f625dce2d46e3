//! Postgres connection and idempotent schema bootstrap.

use anyhow::Context;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

const STATEMENTS: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id          UUID PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            name        TEXT NOT NULL,
            role        TEXT NOT NULL CHECK (role IN ('user', 'staff', 'admin')),
            is_active   BOOLEAN NOT NULL DEFAULT FALSE,
            created_at  TIMESTAMPTZ NOT NULL,
            updated_at  TIMESTAMPTZ NOT NULL,
            version     BIGINT NOT NULL DEFAULT 1
        )
        "#,
    ),
    (
        "users_role_idx",
        "CREATE INDEX IF NOT EXISTS users_role_idx ON users (role)",
    ),
    (
        "role_audit_log",
        r#"
        CREATE TABLE IF NOT EXISTS role_audit_log (
            id             UUID PRIMARY KEY,
            user_id        UUID NOT NULL,
            previous_role  TEXT NOT NULL,
            new_role       TEXT NOT NULL,
            changed_by     UUID NOT NULL,
            reason         TEXT NULL CHECK (reason IS NULL OR char_length(reason) <= 500),
            ip_address     TEXT NULL,
            created_at     TIMESTAMPTZ NOT NULL
        )
        "#,
    ),
    (
        "role_audit_log_user_idx",
        "CREATE INDEX IF NOT EXISTS role_audit_log_user_idx ON role_audit_log (user_id, created_at DESC)",
    ),
    (
        "role_audit_log_actor_idx",
        "CREATE INDEX IF NOT EXISTS role_audit_log_actor_idx ON role_audit_log (changed_by, created_at DESC)",
    ),
];

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

/// Create tables and indexes if they are missing. Safe to run on every start.
pub async fn ensure_schema(pool: &PgPool) -> anyhow::Result<()> {
    for (name, sql) in STATEMENTS {
        sqlx::query(sql)
            .execute(pool)
            .await
            .with_context(|| format!("failed to create {name}"))?;
    }
    tracing::info!(statements = STATEMENTS.len(), "database schema ensured");
    Ok(())
}
