//! `innkeep-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it verifies
//! tokens, knows the role hierarchy, evaluates guards and decides role changes.
//! Loading and persisting records happens in `innkeep-infra`.

pub mod audit;
pub mod authorize;
pub mod claims;
pub mod error;
pub mod hierarchy;
pub mod identity;
pub mod permissions;
pub mod roles;
pub mod user;

pub use audit::{MAX_REASON_LEN, RoleAuditEntry};
pub use authorize::{
    Guard, GuardChain, GuardError, PermissionRequirement, RoleRequirement, require_all_permissions,
    require_all_roles, require_any_permission, require_any_role, require_permission, require_role,
};
pub use claims::{AccessClaims, TokenClaims, TokenCodec, TokenError, TokenKind, TokenValidationError};
pub use error::AuthError;
pub use hierarchy::{assignment_denial_reason, can_assign, permissions_for};
pub use identity::{IdentityContext, join_display_name, split_display_name};
pub use permissions::Permission;
pub use roles::{Role, UnknownRole};
pub use user::{ChangeRole, RoleChangeError, RoleChanged, UserRecord, decide_role_change};
