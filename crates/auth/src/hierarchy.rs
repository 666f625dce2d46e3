//! Role hierarchy: which permissions each role carries and which role
//! assignments each role may perform.
//!
//! Everything here is immutable static data plus pure lookups. There is no
//! registry to initialize and nothing to tear down.

use serde::Serialize;

use crate::{Permission, Role};

const ADMIN_PERMISSIONS: &[Permission] = &Permission::ALL;

const STAFF_PERMISSIONS: &[Permission] = &[
    Permission::UsersRead,
    Permission::UsersUpdate,
    Permission::RoomsCreate,
    Permission::RoomsRead,
    Permission::RoomsUpdate,
    Permission::RoomsDelete,
    Permission::BookingsCreate,
    Permission::BookingsRead,
    Permission::BookingsUpdate,
    Permission::BookingsDelete,
    Permission::ProfileReadOwn,
    Permission::ProfileUpdateOwn,
];

const USER_PERMISSIONS: &[Permission] = &[
    Permission::BookingsCreateOwn,
    Permission::BookingsReadOwn,
    Permission::BookingsUpdateOwn,
    Permission::BookingsCancelOwn,
    Permission::ProfileReadOwn,
    Permission::ProfileUpdateOwn,
    Permission::RoomsRead,
];

/// Ordered permission set granted to a role.
pub fn permissions_for(role: Role) -> &'static [Permission] {
    match role {
        Role::Admin => ADMIN_PERMISSIONS,
        Role::Staff => STAFF_PERMISSIONS,
        Role::User => USER_PERMISSIONS,
    }
}

pub fn has_permission(role: Role, permission: Permission) -> bool {
    permissions_for(role).contains(&permission)
}

/// Whether `actor` may move someone onto `target`.
///
/// This is a per-target gate, not a level comparison: staff may demote to
/// `user` but may not grant `staff`, and a plain user may assign nothing.
pub fn can_assign(actor: Role, target: Role) -> bool {
    assignment_denial_reason(actor, target).is_none()
}

/// Reason an assignment is refused, or `None` when it is allowed.
pub fn assignment_denial_reason(actor: Role, target: Role) -> Option<&'static str> {
    match (target, actor) {
        (Role::Admin, Role::Admin) => None,
        (Role::Admin, _) => Some("Only administrators can assign the admin role"),
        (Role::Staff, Role::Admin) => None,
        (Role::Staff, _) => Some("Only administrators can assign the staff role"),
        (Role::User, Role::User) => Some("Users cannot assign roles"),
        (Role::User, _) => None,
    }
}

/// Roles `actor` is allowed to hand out.
pub fn assignable_roles(actor: Role) -> Vec<Role> {
    Role::ALL
        .into_iter()
        .filter(|target| can_assign(actor, *target))
        .collect()
}

/// Role definition with its granted permissions (for display/audit).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDefinition {
    pub role: Role,
    pub description: &'static str,
    pub permissions: Vec<Permission>,
    pub can_assign: Vec<Role>,
}

pub fn role_definitions() -> Vec<RoleDefinition> {
    Role::ALL
        .into_iter()
        .map(|role| RoleDefinition {
            role,
            description: role_description(role),
            permissions: permissions_for(role).to_vec(),
            can_assign: assignable_roles(role),
        })
        .collect()
}

fn role_description(role: Role) -> &'static str {
    match role {
        Role::Admin => "Full system administrator with all permissions",
        Role::Staff => "Hotel staff managing rooms, bookings and guest accounts",
        Role::User => "Guest managing their own bookings and profile",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_assign_truth_table() {
        let expected = [
            (Role::Admin, Role::Admin, true),
            (Role::Admin, Role::Staff, true),
            (Role::Admin, Role::User, true),
            (Role::Staff, Role::Admin, false),
            (Role::Staff, Role::Staff, false),
            (Role::Staff, Role::User, true),
            (Role::User, Role::Admin, false),
            (Role::User, Role::Staff, false),
            (Role::User, Role::User, false),
        ];

        for (actor, target, allowed) in expected {
            assert_eq!(
                can_assign(actor, target),
                allowed,
                "can_assign({actor}, {target})"
            );
        }
    }

    #[test]
    fn denial_reasons_name_the_target() {
        assert_eq!(
            assignment_denial_reason(Role::Staff, Role::Staff),
            Some("Only administrators can assign the staff role")
        );
        assert_eq!(
            assignment_denial_reason(Role::User, Role::User),
            Some("Users cannot assign roles")
        );
        assert_eq!(assignment_denial_reason(Role::Admin, Role::User), None);
    }

    #[test]
    fn admin_holds_every_permission() {
        for p in Permission::ALL {
            assert!(has_permission(Role::Admin, p), "admin missing {p}");
        }
    }

    #[test]
    fn staff_and_user_sets_are_bounded() {
        assert!(has_permission(Role::Staff, Permission::UsersRead));
        assert!(has_permission(Role::Staff, Permission::BookingsDelete));
        assert!(!has_permission(Role::Staff, Permission::UsersManageRoles));
        assert!(!has_permission(Role::Staff, Permission::AuditRead));

        assert!(has_permission(Role::User, Permission::RoomsRead));
        assert!(has_permission(Role::User, Permission::BookingsCancelOwn));
        assert!(!has_permission(Role::User, Permission::BookingsRead));
        assert!(!has_permission(Role::User, Permission::UsersRead));
    }

    #[test]
    fn definitions_cover_every_role() {
        let defs = role_definitions();
        assert_eq!(defs.len(), 3);
        let user = defs.iter().find(|d| d.role == Role::User).unwrap();
        assert!(user.can_assign.is_empty());
        let staff = defs.iter().find(|d| d.role == Role::Staff).unwrap();
        assert_eq!(staff.can_assign, vec![Role::User]);
    }
}
