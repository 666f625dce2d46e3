//! Role assignment engine: validated, audited role changes plus the read
//! side used by the role routes.

pub mod error;
pub mod service;
pub mod types;

pub use error::RoleError;
pub use service::RoleService;
pub use types::{AssignRole, AssignmentCheck, RoleChangeOutcome, RoleCount, RoleStatistics, UpdateRole, UserSummary};
