use serde::{Deserialize, Serialize};

/// Action a role may be allowed to perform.
///
/// Wire format is `"<resource>:<action>"`, e.g. `"rooms:update"` or
/// `"bookings:read_own"`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "users:create")]
    UsersCreate,
    #[serde(rename = "users:read")]
    UsersRead,
    #[serde(rename = "users:update")]
    UsersUpdate,
    #[serde(rename = "users:delete")]
    UsersDelete,
    #[serde(rename = "users:manage_roles")]
    UsersManageRoles,

    #[serde(rename = "rooms:create")]
    RoomsCreate,
    #[serde(rename = "rooms:read")]
    RoomsRead,
    #[serde(rename = "rooms:update")]
    RoomsUpdate,
    #[serde(rename = "rooms:delete")]
    RoomsDelete,

    #[serde(rename = "bookings:create")]
    BookingsCreate,
    #[serde(rename = "bookings:read")]
    BookingsRead,
    #[serde(rename = "bookings:update")]
    BookingsUpdate,
    #[serde(rename = "bookings:delete")]
    BookingsDelete,

    #[serde(rename = "bookings:create_own")]
    BookingsCreateOwn,
    #[serde(rename = "bookings:read_own")]
    BookingsReadOwn,
    #[serde(rename = "bookings:update_own")]
    BookingsUpdateOwn,
    #[serde(rename = "bookings:cancel_own")]
    BookingsCancelOwn,

    #[serde(rename = "profile:read_own")]
    ProfileReadOwn,
    #[serde(rename = "profile:update_own")]
    ProfileUpdateOwn,

    #[serde(rename = "reports:read")]
    ReportsRead,
    #[serde(rename = "audit:read")]
    AuditRead,
    #[serde(rename = "system:settings")]
    SystemSettings,
}

impl Permission {
    /// Every permission known to the system, in declaration order.
    pub const ALL: [Permission; 22] = [
        Permission::UsersCreate,
        Permission::UsersRead,
        Permission::UsersUpdate,
        Permission::UsersDelete,
        Permission::UsersManageRoles,
        Permission::RoomsCreate,
        Permission::RoomsRead,
        Permission::RoomsUpdate,
        Permission::RoomsDelete,
        Permission::BookingsCreate,
        Permission::BookingsRead,
        Permission::BookingsUpdate,
        Permission::BookingsDelete,
        Permission::BookingsCreateOwn,
        Permission::BookingsReadOwn,
        Permission::BookingsUpdateOwn,
        Permission::BookingsCancelOwn,
        Permission::ProfileReadOwn,
        Permission::ProfileUpdateOwn,
        Permission::ReportsRead,
        Permission::AuditRead,
        Permission::SystemSettings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::UsersCreate => "users:create",
            Permission::UsersRead => "users:read",
            Permission::UsersUpdate => "users:update",
            Permission::UsersDelete => "users:delete",
            Permission::UsersManageRoles => "users:manage_roles",
            Permission::RoomsCreate => "rooms:create",
            Permission::RoomsRead => "rooms:read",
            Permission::RoomsUpdate => "rooms:update",
            Permission::RoomsDelete => "rooms:delete",
            Permission::BookingsCreate => "bookings:create",
            Permission::BookingsRead => "bookings:read",
            Permission::BookingsUpdate => "bookings:update",
            Permission::BookingsDelete => "bookings:delete",
            Permission::BookingsCreateOwn => "bookings:create_own",
            Permission::BookingsReadOwn => "bookings:read_own",
            Permission::BookingsUpdateOwn => "bookings:update_own",
            Permission::BookingsCancelOwn => "bookings:cancel_own",
            Permission::ProfileReadOwn => "profile:read_own",
            Permission::ProfileUpdateOwn => "profile:update_own",
            Permission::ReportsRead => "reports:read",
            Permission::AuditRead => "audit:read",
            Permission::SystemSettings => "system:settings",
        }
    }

    /// Resource half of the wire name (`"rooms"` for `rooms:update`).
    pub fn category(&self) -> &'static str {
        self.as_str().split(':').next().unwrap_or_default()
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| format!("unknown permission '{wanted}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_agree_with_serde() {
        for p in Permission::ALL {
            let json = serde_json::to_string(&p).unwrap();
            assert_eq!(json, format!("\"{}\"", p.as_str()));
            assert_eq!(p.as_str().parse::<Permission>().unwrap(), p);
        }
    }

    #[test]
    fn category_is_resource_prefix() {
        assert_eq!(Permission::BookingsReadOwn.category(), "bookings");
        assert_eq!(Permission::SystemSettings.category(), "system");
    }
}
