//! Service wiring: stores, token codec and the role engine.

use std::sync::Arc;

use anyhow::Context;

use innkeep_auth::TokenCodec;
use innkeep_core::{Clock, SystemClock};
use innkeep_infra::{
    AuditLog, InMemoryAuditLog, InMemoryUserStore, PostgresAuditLog, PostgresUserStore, RoleService, UserStore,
    schema,
};

use crate::config::Settings;

#[derive(Clone)]
pub struct AppServices {
    pub codec: TokenCodec,
    pub users: Arc<dyn UserStore>,
    pub clock: Arc<dyn Clock>,
    pub roles: RoleService,
}

impl AppServices {
    pub fn new(
        codec: TokenCodec,
        users: Arc<dyn UserStore>,
        audit: Arc<dyn AuditLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let roles = RoleService::new(users.clone(), audit, clock.clone());
        Self {
            codec,
            users,
            clock,
            roles,
        }
    }

    /// In-memory stores and the wall clock (dev and tests).
    pub fn in_memory(codec: TokenCodec) -> Self {
        Self::new(
            codec,
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryAuditLog::new()),
            Arc::new(SystemClock),
        )
    }
}

pub async fn build_services(settings: &Settings) -> anyhow::Result<AppServices> {
    let codec = settings.token_codec();

    if !settings.use_persistent_stores {
        tracing::info!("using in-memory stores");
        return Ok(AppServices::in_memory(codec));
    }

    let database_url = settings
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")?;

    let pool = schema::connect(database_url).await?;
    schema::ensure_schema(&pool).await?;
    tracing::info!("using Postgres stores");

    Ok(AppServices::new(
        codec,
        Arc::new(PostgresUserStore::new(pool.clone())),
        Arc::new(PostgresAuditLog::new(pool)),
        Arc::new(SystemClock),
    ))
}
