//! In-process user store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::store::{StoreError, StoreHealth, StoreResult, UserStore};
use crate::users::types::{NewUser, User, UserUpdate};

/// A thread-safe user store backed by `DashMap`.
///
/// Used when no database is configured, and by tests.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<DashMap<String, User>>,
    /// email -> user_id
    by_email: Arc<DashMap<String, String>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let Some(user_id) = self.by_email.get(email).map(|r| r.value().clone()) else {
            return Ok(None);
        };
        Ok(self.users.get(&user_id).map(|r| r.value().clone()))
    }

    async fn find_by_id(&self, user_id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.get(user_id).map(|r| r.value().clone()))
    }

    async fn create(&self, new: NewUser) -> StoreResult<User> {
        // Holding the email entry makes check-and-insert atomic per email.
        match self.by_email.entry(new.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "email {} already registered",
                new.email
            ))),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let user = User {
                    user_id: Uuid::new_v4().to_string(),
                    name: new.name,
                    email: new.email,
                    picture_url: new.picture_url,
                    phone_number: new.phone_number,
                    location: new.location,
                    reputation: 0,
                    created_at: now,
                    updated_at: now,
                };
                self.users.insert(user.user_id.clone(), user.clone());
                slot.insert(user.user_id.clone());
                Ok(user)
            }
        }
    }

    async fn update(&self, user_id: &str, update: UserUpdate) -> StoreResult<Option<User>> {
        let Some(mut entry) = self.users.get_mut(user_id) else {
            return Ok(None);
        };
        let user = entry.value_mut();
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(picture_url) = update.picture_url {
            user.picture_url = Some(picture_url);
        }
        if let Some(phone_number) = update.phone_number {
            user.phone_number = Some(phone_number);
        }
        if let Some(location) = update.location {
            user.location = Some(location);
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn list(&self, limit: u32, offset: u32) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|r| r.value().clone()).collect();
        users.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(users
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

#[async_trait]
impl StoreHealth for InMemoryUserStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Sam".into(),
            email: email.into(),
            picture_url: None,
            phone_number: None,
            location: None,
        }
    }

    #[tokio::test]
    async fn create_then_find() {
        let store = InMemoryUserStore::new();
        let created = store.create(new_user("sam@trego.app")).await.unwrap();

        assert_eq!(created.reputation, 0);
        let by_email = store.find_by_email("sam@trego.app").await.unwrap().unwrap();
        let by_id = store.find_by_id(&created.user_id).await.unwrap().unwrap();
        assert_eq!(by_email, created);
        assert_eq!(by_id, created);
    }

    #[tokio::test]
    async fn missing_is_none_not_error() {
        let store = InMemoryUserStore::new();
        assert!(store.find_by_email("nobody@trego.app").await.unwrap().is_none());
        assert!(store.find_by_id("nope").await.unwrap().is_none());
        assert!(store
            .update("nope", UserUpdate::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = InMemoryUserStore::new();
        store.create(new_user("dup@trego.app")).await.unwrap();
        let err = store.create(new_user("dup@trego.app")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() {
        let store = InMemoryUserStore::new();
        let created = store.create(new_user("u@trego.app")).await.unwrap();

        let updated = store
            .update(
                &created.user_id,
                UserUpdate {
                    location: Some("Riverside Courts".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Sam");
        assert_eq!(updated.location.as_deref(), Some("Riverside Courts"));
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn list_pages_in_creation_order() {
        let store = InMemoryUserStore::new();
        for i in 0..5 {
            store.create(new_user(&format!("p{}@trego.app", i))).await.unwrap();
        }

        let page = store.list(2, 1).await.unwrap();
        assert_eq!(page.len(), 2);
        let all = store.list(10, 0).await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(page[0], all[1]);
        assert!(store.list(10, 5).await.unwrap().is_empty());
    }
}
