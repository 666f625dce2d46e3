use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use innkeep_auth::{Role, RoleChanged, UserRecord};
use innkeep_core::{ExpectedVersion, UserId};

use super::query::{Page, SortOrder, UserQuery, UserSortField};
use super::{RoleChangeVersions, StoreError, UserStore, normalize_email};

/// In-memory user store.
///
/// Intended for tests/dev. The version check and the write happen under one
/// write lock, so concurrent role changes serialize cleanly.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Backend("lock poisoned".to_string())
    }
}

fn compare(a: &UserRecord, b: &UserRecord, field: UserSortField) -> Ordering {
    let primary = match field {
        UserSortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        UserSortField::Email => a.email.cmp(&b.email),
        UserSortField::CreatedAt => a.created_at.cmp(&b.created_at),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().map_err(|_| Self::poisoned())?;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let wanted = normalize_email(email);
        let users = self.users.read().map_err(|_| Self::poisoned())?;
        Ok(users.values().find(|u| u.email == wanted).cloned())
    }

    async fn insert(&self, user: UserRecord) -> Result<(), StoreError> {
        let mut users = self.users.write().map_err(|_| Self::poisoned())?;
        if users.contains_key(&user.id) {
            return Err(StoreError::Duplicate(format!("user id {}", user.id)));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(format!("email {}", user.email)));
        }
        users.insert(user.id, user);
        Ok(())
    }

    async fn save_role_change(
        &self,
        change: &RoleChanged,
        versions: RoleChangeVersions,
    ) -> Result<UserRecord, StoreError> {
        let mut users = self.users.write().map_err(|_| Self::poisoned())?;

        if let ExpectedVersion::Exact(_) = versions.actor {
            let actor = users.get(&change.changed_by).ok_or_else(|| {
                StoreError::Concurrency(format!("actor {} no longer exists", change.changed_by))
            })?;
            versions
                .actor
                .check(actor.version)
                .map_err(|e| StoreError::Concurrency(format!("actor {}: {e}", change.changed_by)))?;
        }

        let user = users.get_mut(&change.user_id).ok_or(StoreError::NotFound)?;
        versions
            .target
            .check(user.version)
            .map_err(|e| StoreError::Concurrency(e.to_string()))?;

        user.apply(change);
        Ok(user.clone())
    }

    async fn list_by_role(&self, role: Role, query: &UserQuery) -> Result<Page<UserRecord>, StoreError> {
        let users = self.users.read().map_err(|_| Self::poisoned())?;
        let mut matching: Vec<&UserRecord> = users.values().filter(|u| u.role == role).collect();

        matching.sort_by(|a, b| {
            let ord = compare(a, b, query.sort_by);
            match query.sort_order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .cloned()
            .collect();

        Ok(Page::new(items, total, query))
    }

    async fn count_by_role(&self) -> Result<Vec<(Role, u64)>, StoreError> {
        let users = self.users.read().map_err(|_| Self::poisoned())?;
        Ok(Role::ALL
            .into_iter()
            .map(|role| (role, users.values().filter(|u| u.role == role).count() as u64))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn user(name: &str, email: &str, role: Role, minutes_ago: i64) -> UserRecord {
        UserRecord::new(
            UserId::new(),
            email,
            name,
            role,
            true,
            Utc::now() - Duration::minutes(minutes_ago),
        )
    }

    fn change_for(user: &UserRecord, new_role: Role) -> RoleChanged {
        RoleChanged {
            user_id: user.id,
            previous_role: user.role,
            new_role,
            changed_by: UserId::new(),
            reason: None,
            origin: None,
            occurred_at: Utc::now(),
        }
    }

    fn target_only(version: u64) -> RoleChangeVersions {
        RoleChangeVersions {
            target: ExpectedVersion::Exact(version),
            actor: ExpectedVersion::Any,
        }
    }

    #[tokio::test]
    async fn email_lookup_is_normalized() {
        let store = InMemoryUserStore::new();
        store.insert(user("Ada Lovelace", "Ada@Example.com", Role::User, 0)).await.unwrap();

        let found = store.find_by_email("  ada@example.COM ").await.unwrap();
        assert!(found.is_some());
        assert!(store.find_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_refused() {
        let store = InMemoryUserStore::new();
        store.insert(user("A", "same@example.com", Role::User, 0)).await.unwrap();
        let err = store.insert(user("B", "same@example.com", Role::User, 0)).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn stale_version_is_a_conflict() {
        let store = InMemoryUserStore::new();
        let guest = user("Guest", "guest@example.com", Role::User, 0);
        store.insert(guest.clone()).await.unwrap();

        let updated = store
            .save_role_change(&change_for(&guest, Role::Staff), target_only(guest.version))
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Staff);
        assert_eq!(updated.version, guest.version + 1);

        // Second writer still holds the old version.
        let err = store
            .save_role_change(&change_for(&guest, Role::Admin), target_only(guest.version))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));
        assert_eq!(store.get(guest.id).await.unwrap().unwrap().role, Role::Staff);
    }

    #[tokio::test]
    async fn changed_actor_is_a_conflict() {
        let store = InMemoryUserStore::new();
        let admin = user("Admin", "admin@example.com", Role::Admin, 0);
        let guest = user("Guest", "guest@example.com", Role::User, 0);
        store.insert(admin.clone()).await.unwrap();
        store.insert(guest.clone()).await.unwrap();

        let demotion = RoleChanged {
            changed_by: UserId::new(),
            ..change_for(&admin, Role::User)
        };
        store.save_role_change(&demotion, target_only(admin.version)).await.unwrap();

        let promotion = RoleChanged {
            changed_by: admin.id,
            ..change_for(&guest, Role::Admin)
        };
        let versions = RoleChangeVersions {
            target: ExpectedVersion::Exact(guest.version),
            actor: ExpectedVersion::Exact(admin.version),
        };
        let err = store.save_role_change(&promotion, versions).await.unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));
        assert_eq!(store.get(guest.id).await.unwrap().unwrap().role, Role::User);

        let ghost = RoleChanged {
            changed_by: UserId::new(),
            ..change_for(&guest, Role::Staff)
        };
        let versions = RoleChangeVersions {
            target: ExpectedVersion::Exact(guest.version),
            actor: ExpectedVersion::Exact(1),
        };
        let err = store.save_role_change(&ghost, versions).await.unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));
    }

    #[tokio::test]
    async fn list_by_role_sorts_and_pages() {
        let store = InMemoryUserStore::new();
        store.insert(user("Charlie", "c@example.com", Role::Staff, 3)).await.unwrap();
        store.insert(user("alice", "a@example.com", Role::Staff, 1)).await.unwrap();
        store.insert(user("Bob", "b@example.com", Role::Staff, 2)).await.unwrap();
        store.insert(user("Zed", "z@example.com", Role::User, 0)).await.unwrap();

        let query = UserQuery {
            page: 1,
            limit: 2,
            sort_by: UserSortField::Name,
            sort_order: SortOrder::Asc,
        };
        let page = store.list_by_role(Role::Staff, &query).await.unwrap();
        let names: Vec<_> = page.items.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "Bob"]);
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);

        let newest_first = store.list_by_role(Role::Staff, &UserQuery::default()).await.unwrap();
        assert_eq!(newest_first.items[0].name, "alice");
    }

    #[tokio::test]
    async fn counts_include_empty_roles() {
        let store = InMemoryUserStore::new();
        store.insert(user("A", "a@example.com", Role::User, 0)).await.unwrap();
        store.insert(user("B", "b@example.com", Role::User, 0)).await.unwrap();

        let counts = store.count_by_role().await.unwrap();
        assert_eq!(counts, vec![(Role::User, 2), (Role::Staff, 0), (Role::Admin, 0)]);
    }
}
