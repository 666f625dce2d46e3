use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use innkeep_auth::{
    ChangeRole, Role, RoleAuditEntry, RoleChangeError, UserRecord, assignment_denial_reason,
    decide_role_change,
};
use innkeep_core::{AggregateRoot, Clock, ExpectedVersion, UserId};

use super::error::RoleError;
use super::types::{
    AssignRole, AssignmentCheck, RoleChangeOutcome, RoleCount, RoleStatistics, UpdateRole, UserSummary,
};
use crate::audit::AuditLog;
use crate::store::{Page, RoleChangeVersions, StoreError, UserQuery, UserStore};

/// Largest look-back accepted by [`RoleService::recent_audit`].
pub const MAX_AUDIT_LOOKBACK_DAYS: u32 = 365;

/// Role assignment engine.
///
/// Every write runs load, decide, persist with a version check, then audit.
/// Nothing is written unless every check passes, and a lost version race
/// writes nothing at all (no role change, no audit entry).
#[derive(Clone)]
pub struct RoleService {
    users: Arc<dyn UserStore>,
    audit: Arc<dyn AuditLog>,
    clock: Arc<dyn Clock>,
}

impl RoleService {
    pub fn new(users: Arc<dyn UserStore>, audit: Arc<dyn AuditLog>, clock: Arc<dyn Clock>) -> Self {
        Self { users, audit, clock }
    }

    #[instrument(
        skip(self, cmd),
        fields(target = %cmd.target, actor = %cmd.actor, new_role = %cmd.new_role)
    )]
    pub async fn assign_user_role(&self, cmd: AssignRole) -> Result<RoleChangeOutcome, RoleError> {
        self.change_role(ChangeRole {
            target: cmd.target,
            actor: cmd.actor,
            new_role: cmd.new_role,
            expected_current: None,
            reason: normalize_reason(cmd.reason),
            origin: cmd.origin,
            occurred_at: self.clock.now(),
        })
        .await
    }

    #[instrument(
        skip(self, cmd),
        fields(target = %cmd.target, actor = %cmd.actor, current_role = %cmd.current_role, new_role = %cmd.new_role)
    )]
    pub async fn update_user_role(&self, cmd: UpdateRole) -> Result<RoleChangeOutcome, RoleError> {
        self.change_role(ChangeRole {
            target: cmd.target,
            actor: cmd.actor,
            new_role: cmd.new_role,
            expected_current: Some(cmd.current_role),
            reason: normalize_reason(cmd.reason),
            origin: cmd.origin,
            occurred_at: self.clock.now(),
        })
        .await
    }

    async fn change_role(&self, cmd: ChangeRole) -> Result<RoleChangeOutcome, RoleError> {
        cmd.validate_input()?;

        let target = self.load(cmd.target).await?;
        let actor = self.load(cmd.actor).await?;

        let change = decide_role_change(&target, &actor, &cmd).inspect_err(|err| {
            if matches!(err, RoleChangeError::Denied { .. }) {
                tracing::warn!(actor_role = %actor.role, reason = %err, "role assignment denied");
            }
        })?;

        // The decision used the actor's role as read above; the write only
        // lands if neither record has moved since.
        let versions = RoleChangeVersions {
            target: ExpectedVersion::Exact(target.version()),
            actor: ExpectedVersion::Exact(actor.version()),
        };
        let updated = self.users.save_role_change(&change, versions).await?;

        // The role change is already committed; a lost audit record must not
        // turn it into a reported failure.
        if let Err(err) = self.audit.append(RoleAuditEntry::from_change(&change)).await {
            tracing::error!(
                error = %err,
                user_id = %change.user_id,
                changed_by = %change.changed_by,
                "failed to append role audit entry"
            );
        }

        tracing::info!(
            user_id = %change.user_id,
            changed_by = %change.changed_by,
            previous_role = %change.previous_role,
            new_role = %change.new_role,
            "role changed"
        );

        Ok(RoleChangeOutcome {
            user: UserSummary::from(&updated),
            previous_role: change.previous_role,
            new_role: change.new_role,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_user_role(&self, user_id: UserId) -> Result<UserSummary, RoleError> {
        self.load(user_id).await.map(UserSummary::from)
    }

    #[instrument(skip(self, query), fields(role = %role))]
    pub async fn get_users_by_role(&self, role: Role, query: &UserQuery) -> Result<Page<UserSummary>, RoleError> {
        query.validate()?;
        let page = self.users.list_by_role(role, query).await?;
        Ok(page.map(UserSummary::from))
    }

    /// Dry run of the hierarchy check for `actor_id`; nothing is written.
    #[instrument(skip(self))]
    pub async fn validate_role_assignment(
        &self,
        actor_id: UserId,
        target_role: Role,
    ) -> Result<AssignmentCheck, RoleError> {
        let actor = self.load(actor_id).await?;
        let reason = assignment_denial_reason(actor.role, target_role);
        Ok(AssignmentCheck {
            is_valid: reason.is_none(),
            can_assign: reason.is_none(),
            reason: reason.map(str::to_string),
        })
    }

    #[instrument(skip(self))]
    pub async fn role_statistics(&self) -> Result<RoleStatistics, RoleError> {
        let counts = self.users.count_by_role().await?;
        Ok(RoleStatistics {
            total_users: counts.iter().map(|(_, n)| n).sum(),
            by_role: counts
                .into_iter()
                .map(|(role, count)| RoleCount { role, count })
                .collect(),
        })
    }

    pub async fn user_audit(&self, user_id: UserId) -> Result<Vec<RoleAuditEntry>, RoleError> {
        self.audit.by_user(user_id).await.map_err(audit_query_failed)
    }

    pub async fn actor_audit(&self, actor_id: UserId) -> Result<Vec<RoleAuditEntry>, RoleError> {
        self.audit.by_actor(actor_id).await.map_err(audit_query_failed)
    }

    pub async fn role_audit(&self, role: Role) -> Result<Vec<RoleAuditEntry>, RoleError> {
        self.audit.by_role(role).await.map_err(audit_query_failed)
    }

    pub async fn audit_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<RoleAuditEntry>, RoleError> {
        if from > to {
            return Err(RoleError::Validation("'from' must not be after 'to'".to_string()));
        }
        self.audit
            .by_date_range(from, to)
            .await
            .map_err(audit_query_failed)
    }

    pub async fn recent_audit(&self, days: u32) -> Result<Vec<RoleAuditEntry>, RoleError> {
        if !(1..=MAX_AUDIT_LOOKBACK_DAYS).contains(&days) {
            return Err(RoleError::Validation(format!(
                "days must be between 1 and {MAX_AUDIT_LOOKBACK_DAYS}"
            )));
        }
        self.audit
            .recent(days, self.clock.now())
            .await
            .map_err(audit_query_failed)
    }

    async fn load(&self, id: UserId) -> Result<UserRecord, RoleError> {
        self.users.get(id).await?.ok_or(RoleError::UserNotFound)
    }
}

fn audit_query_failed(err: StoreError) -> RoleError {
    tracing::error!(error = %err, "audit log query failed");
    RoleError::Internal
}

fn normalize_reason(reason: Option<String>) -> Option<String> {
    reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
}
