//! User record storage boundary.
//!
//! The authorization core only needs a narrow slice of the user store: load by
//! id or email, persist a role change with an optimistic version check, and
//! list users by role.

pub mod in_memory;
pub mod postgres;
pub mod query;

use thiserror::Error;

use innkeep_auth::{Role, RoleChanged, UserRecord};
use innkeep_core::{ExpectedVersion, UserId};

pub use in_memory::InMemoryUserStore;
pub use postgres::PostgresUserStore;
pub use query::{Page, SortOrder, UserQuery, UserSortField};

/// Versions observed while a role change was decided.
///
/// The target and the acting user must both be unchanged at write time; a
/// demoted actor must not commit a change approved under their old role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleChangeVersions {
    pub target: ExpectedVersion,
    pub actor: ExpectedVersion,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The record changed between read and write.
    #[error("concurrency conflict: {0}")]
    Concurrency(String),

    #[error("duplicate record: {0}")]
    Duplicate(String),

    #[error("record not found")]
    NotFound,

    /// Connection, query or decoding failure in the backing store.
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Exact match on the normalized (trimmed, lowercased) address.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn insert(&self, user: UserRecord) -> Result<(), StoreError>;

    /// Persist a decided role change if the target and the actor
    /// (`change.changed_by`) are still at the observed versions.
    ///
    /// Returns the updated record. Fails with [`StoreError::Concurrency`] when
    /// another writer touched either record first, or the actor vanished, and
    /// with [`StoreError::NotFound`] when the target vanished.
    async fn save_role_change(
        &self,
        change: &RoleChanged,
        versions: RoleChangeVersions,
    ) -> Result<UserRecord, StoreError>;

    async fn list_by_role(&self, role: Role, query: &UserQuery) -> Result<Page<UserRecord>, StoreError>;

    /// Number of users per role; roles without users are reported as zero.
    async fn count_by_role(&self) -> Result<Vec<(Role, u64)>, StoreError>;
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
