//! Infrastructure layer: user store, audit log, identity resolution and the
//! role assignment engine.

pub mod audit;
pub mod identity;
pub mod roles;
pub mod schema;
pub mod store;

pub use audit::{AuditFilter, AuditLog, InMemoryAuditLog, PostgresAuditLog};
pub use identity::resolve_identity;
pub use roles::{
    AssignRole, AssignmentCheck, RoleChangeOutcome, RoleError, RoleService, RoleStatistics, UpdateRole,
    UserSummary,
};
pub use store::{
    InMemoryUserStore, Page, PostgresUserStore, RoleChangeVersions, SortOrder, StoreError, UserQuery,
    UserSortField, UserStore,
};
