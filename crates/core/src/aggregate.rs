//! Aggregate root trait and optimistic concurrency expectations.

use crate::error::{DomainError, DomainResult};

/// Aggregate root marker + minimal interface.
///
/// Persisted records that are mutated through read-validate-write sequences
/// expose a version so writers can detect that someone else got there first.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Monotonically increasing version of the aggregate's state.
    ///
    /// Incremented by exactly one on every persisted mutation.
    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation for an aggregate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (administrative repair, seeding).
    Any,
    /// Require the aggregate to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_version_mismatch_is_a_conflict() {
        assert!(ExpectedVersion::Exact(3).check(3).is_ok());
        let err = ExpectedVersion::Exact(3).check(4).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert!(ExpectedVersion::Any.matches(42));
    }
}
