//! Role management endpoints.
//!
//! Every route here sits behind token verification; the per-route guards
//! below add role or permission requirements on top.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, rejection::JsonRejection},
    routing::{get, post},
};

use innkeep_auth::{
    IdentityContext, Permission, Role, hierarchy, require_any_role, require_permission, require_role,
};
use innkeep_core::UserId;
use innkeep_infra::{
    AssignRole, AssignmentCheck, Page, RoleChangeOutcome, RoleStatistics, UpdateRole, UserSummary,
};

use crate::app::dto::{
    self, AssignRoleRequest, AuditParams, AuditResponse, AuditSelector, ListUsersParams, PermissionsResponse,
    UpdateRoleRequest, ValidateAssignmentRequest,
};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::ClientOrigin;
use crate::guards::guarded;

type ApiResult<T> = Result<Json<T>, ApiError>;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    let any_authenticated = Router::new()
        .route("/", get(list_role_definitions))
        .route("/me/permissions", get(my_permissions))
        .route("/validate", post(validate_assignment));

    let readers = guarded(
        Router::new()
            .route("/users/:id", get(get_user_role))
            .route("/:role/users", get(get_users_by_role)),
        require_permission(Permission::UsersRead),
    );

    let assigners = guarded(
        Router::new()
            .route("/users/:id/assign", post(assign_user_role))
            .route("/users/:id", axum::routing::put(update_user_role)),
        require_any_role([Role::Staff, Role::Admin]),
    );

    let admins = guarded(
        Router::new().route("/statistics", get(role_statistics)),
        require_role(Role::Admin),
    );

    let auditors = guarded(
        Router::new().route("/audit", get(query_audit)),
        require_permission(Permission::AuditRead),
    );

    any_authenticated
        .merge(readers)
        .merge(assigners)
        .merge(admins)
        .merge(auditors)
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /roles - Every role with its permissions and assignable roles.
pub async fn list_role_definitions() -> Json<Vec<hierarchy::RoleDefinition>> {
    Json(hierarchy::role_definitions())
}

/// GET /roles/me/permissions
pub async fn my_permissions(Extension(identity): Extension<IdentityContext>) -> Json<PermissionsResponse> {
    Json(PermissionsResponse {
        role: identity.role,
        permissions: identity.permissions(),
        can_assign: hierarchy::assignable_roles(identity.role),
    })
}

/// POST /roles/validate - Dry run: may the caller hand out `targetRole`?
pub async fn validate_assignment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<IdentityContext>,
    body: Result<Json<ValidateAssignmentRequest>, JsonRejection>,
) -> ApiResult<AssignmentCheck> {
    let Json(body) = body.map_err(reject_body)?;
    let target_role: Role = dto::parse_field("targetRole", &body.target_role)?;

    let check = services
        .roles
        .validate_role_assignment(identity.user_id, target_role)
        .await?;
    Ok(Json(check))
}

/// GET /roles/users/:id
pub async fn get_user_role(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<UserSummary> {
    let user_id: UserId = dto::parse_field("user id", &id)?;
    Ok(Json(services.roles.get_user_role(user_id).await?))
}

/// GET /roles/:role/users?page=&limit=&sortBy=&sortOrder=
pub async fn get_users_by_role(
    Extension(services): Extension<Arc<AppServices>>,
    Path(role): Path<String>,
    Query(params): Query<ListUsersParams>,
) -> ApiResult<Page<UserSummary>> {
    let role: Role = dto::parse_field("role", &role)?;
    let query = params.into_query()?;
    Ok(Json(services.roles.get_users_by_role(role, &query).await?))
}

/// POST /roles/users/:id/assign
pub async fn assign_user_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<IdentityContext>,
    origin: ClientOrigin,
    Path(id): Path<String>,
    body: Result<Json<AssignRoleRequest>, JsonRejection>,
) -> ApiResult<RoleChangeOutcome> {
    let Json(body) = body.map_err(reject_body)?;
    let cmd = AssignRole {
        target: dto::parse_field("user id", &id)?,
        actor: identity.user_id,
        new_role: dto::parse_field("role", &body.role)?,
        reason: body.reason,
        origin: origin.into_inner(),
    };

    Ok(Json(services.roles.assign_user_role(cmd).await?))
}

/// PUT /roles/users/:id
pub async fn update_user_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<IdentityContext>,
    origin: ClientOrigin,
    Path(id): Path<String>,
    body: Result<Json<UpdateRoleRequest>, JsonRejection>,
) -> ApiResult<RoleChangeOutcome> {
    let Json(body) = body.map_err(reject_body)?;
    let cmd = UpdateRole {
        target: dto::parse_field("user id", &id)?,
        actor: identity.user_id,
        current_role: dto::parse_field("currentRole", &body.current_role)?,
        new_role: dto::parse_field("newRole", &body.new_role)?,
        reason: body.reason,
        origin: origin.into_inner(),
    };

    Ok(Json(services.roles.update_user_role(cmd).await?))
}

/// GET /roles/statistics
pub async fn role_statistics(Extension(services): Extension<Arc<AppServices>>) -> ApiResult<RoleStatistics> {
    Ok(Json(services.roles.role_statistics().await?))
}

/// GET /roles/audit?userId= | actorId= | role= | from=&to= | days=
pub async fn query_audit(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<AuditParams>,
) -> ApiResult<AuditResponse> {
    let roles = &services.roles;
    let entries = match params.into_selector()? {
        AuditSelector::User(user_id) => roles.user_audit(user_id).await?,
        AuditSelector::Actor(actor_id) => roles.actor_audit(actor_id).await?,
        AuditSelector::Role(role) => roles.role_audit(role).await?,
        AuditSelector::Between(from, to) => roles.audit_between(from, to).await?,
        AuditSelector::Recent(days) => roles.recent_audit(days).await?,
    };
    Ok(Json(AuditResponse::from(entries)))
}

fn reject_body(rejection: JsonRejection) -> ApiError {
    ApiError::validation(rejection.body_text())
}
