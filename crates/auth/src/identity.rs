//! Request-scoped identity derived from a persisted user record.

use serde::Serialize;

use innkeep_core::UserId;

use crate::{AuthError, Permission, Role, UserRecord, hierarchy};

/// Who is making the current request.
///
/// Built fresh for every request from the stored user record and dropped when
/// the request ends; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityContext {
    pub user_id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub role: Role,
}

impl IdentityContext {
    /// Derive the identity for a loaded user, refusing inactive accounts.
    pub fn from_record(record: &UserRecord) -> Result<Self, AuthError> {
        if !record.is_active {
            return Err(AuthError::EmailNotVerified);
        }

        let (first_name, last_name) = split_display_name(&record.name);
        Ok(Self {
            user_id: record.id,
            email: record.email.clone(),
            first_name,
            last_name,
            is_active: record.is_active,
            role: record.role,
        })
    }

    /// Single-field display form, as stored on the user record.
    pub fn display_name(&self) -> String {
        join_display_name(&self.first_name, &self.last_name)
    }

    pub fn permissions(&self) -> &'static [Permission] {
        hierarchy::permissions_for(self.role)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        hierarchy::has_permission(self.role, permission)
    }
}

/// Split the single stored name into `(first, last)`.
///
/// The store keeps one name field while the API exposes two. The first
/// whitespace-delimited token is the first name and everything after it is the
/// last name, so `"Mary Ann Smith"` gives `("Mary", "Ann Smith")`. A one-word
/// name gives an empty last name; that is the expected result, not a data error.
pub fn split_display_name(name: &str) -> (String, String) {
    let name = name.trim();
    match name.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim_start().to_string()),
        None => (name.to_string(), String::new()),
    }
}

/// Inverse of [`split_display_name`]: rebuild the stored single name from
/// the two API fields.
pub fn join_display_name(first_name: &str, last_name: &str) -> String {
    let first = first_name.trim();
    let last = last_name.trim();
    match (first.is_empty(), last.is_empty()) {
        (_, true) => first.to_string(),
        (true, false) => last.to_string(),
        (false, false) => format!("{first} {last}"),
    }
}
