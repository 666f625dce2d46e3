//! `innkeep-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod clock;
pub mod error;
pub mod id;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::{AuditEntryId, UserId};
