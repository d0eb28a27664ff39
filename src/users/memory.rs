use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::users::dto::UpdatableFields;
use crate::users::error::{UserError, UserResult};
use crate::users::repo::UserStore;
use crate::users::repo_types::User;

/// In-memory `UserStore` used by the unit and router tests.
/// Keeps insertion order, like the `_id` sort of the Mongo store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<Vec<User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Case-insensitive substring match over the searchable fields.
/// `needle` must already be lowercased.
fn matches_search(user: &User, needle: &str) -> bool {
    [
        Some(&user.email),
        Some(&user.first_name),
        Some(&user.last_name),
        user.city.as_ref(),
    ]
    .into_iter()
    .flatten()
    .any(|value| value.to_lowercase().contains(needle))
}

fn email_in_use(users: &[User], email: &str, except: Option<ObjectId>) -> bool {
    users
        .iter()
        .any(|u| u.email == email && Some(u.id) != except)
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;
        if email_in_use(&users, &user.email, None) {
            return Err(UserError::DuplicateEmail(user.email));
        }
        users.push(user.clone());
        tracing::info!(user_id = %user.id, "user created");
        Ok(user)
    }

    async fn find_by_id(&self, id: ObjectId) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_all(&self, search: Option<&str>) -> UserResult<Vec<User>> {
        let users = self.users.read().await;
        let needle = search.unwrap_or_default().to_lowercase();
        Ok(users
            .iter()
            .filter(|u| needle.is_empty() || matches_search(u, &needle))
            .cloned()
            .collect())
    }

    async fn email_taken(&self, email: &str, except: Option<ObjectId>) -> UserResult<bool> {
        let users = self.users.read().await;
        Ok(email_in_use(&users, email, except))
    }

    async fn update_fields(
        &self,
        id: ObjectId,
        changes: &UpdatableFields,
    ) -> UserResult<Option<User>> {
        let mut users = self.users.write().await;
        if let Some(email) = &changes.email {
            if email_in_use(&users, email, Some(id)) {
                return Err(UserError::DuplicateEmail(email.clone()));
            }
        }
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.apply(changes);
        tracing::info!(user_id = %id, "user updated");
        Ok(Some(user.clone()))
    }

    async fn set_password_hash(
        &self,
        id: ObjectId,
        password_hash: &str,
    ) -> UserResult<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        user.password_hash = password_hash.to_string();
        tracing::info!(user_id = %id, "user password updated");
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: ObjectId) -> UserResult<Option<User>> {
        let mut users = self.users.write().await;
        let Some(pos) = users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };
        let removed = users.remove(pos);
        tracing::info!(user_id = %id, "user deleted");
        Ok(Some(removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(email: &str, first: &str, last: &str, city: Option<&str>) -> User {
        User::new(
            email.into(),
            "hash".into(),
            first.into(),
            last.into(),
            city.map(Into::into),
        )
    }

    #[test]
    fn search_covers_every_searchable_field() {
        let jon = user("jon@example.com", "Jon", "Doe", None);
        assert!(matches_search(&jon, "do"));
        assert!(matches_search(&jon, "n@e"));
        assert!(!matches_search(&jon, "jmerenka"));

        let jane = user("jane@example.com", "Jane", "Eod", Some("Jmerenka"));
        assert!(matches_search(&jane, "jmerenka"));
    }

    #[tokio::test]
    async fn insert_and_find() {
        let store = InMemoryUserStore::new();
        let created = store
            .insert(user("jon@example.com", "Jon", "Doe", None))
            .await
            .unwrap();

        let fetched = store.find_by_id(created.id).await.unwrap();
        assert_eq!(fetched, Some(created));
        assert!(store.find_by_id(ObjectId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = InMemoryUserStore::new();
        store
            .insert(user("jon@example.com", "Jon", "Doe", None))
            .await
            .unwrap();

        let result = store
            .insert(user("jon@example.com", "Other", "Person", None))
            .await;
        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn search_is_case_insensitive_over_all_fields() {
        let store = InMemoryUserStore::new();
        let jon = store
            .insert(user("jon@example.com", "Jon", "Doe", None))
            .await
            .unwrap();
        let jane = store
            .insert(user("jane@example.com", "Jane", "Eod", Some("Jmerenka")))
            .await
            .unwrap();

        let found = store.find_all(Some("DO")).await.unwrap();
        assert_eq!(found, vec![jon.clone()]);

        let found = store.find_all(Some("jmer")).await.unwrap();
        assert_eq!(found, vec![jane.clone()]);

        let all = store.find_all(None).await.unwrap();
        assert_eq!(all, vec![jon, jane]);
    }

    #[tokio::test]
    async fn update_rejects_email_of_another_user() {
        let store = InMemoryUserStore::new();
        let jon = store
            .insert(user("jon@example.com", "Jon", "Doe", None))
            .await
            .unwrap();
        store
            .insert(user("jane@example.com", "Jane", "Eod", None))
            .await
            .unwrap();

        let changes = UpdatableFields {
            email: Some("jane@example.com".into()),
            ..Default::default()
        };
        let result = store.update_fields(jon.id, &changes).await;
        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));

        // keeping your own email is fine
        let changes = UpdatableFields {
            email: Some("jon@example.com".into()),
            ..Default::default()
        };
        assert!(store.update_fields(jon.id, &changes).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_returns_removed_record_once() {
        let store = InMemoryUserStore::new();
        let jon = store
            .insert(user("jon@example.com", "Jon", "Doe", None))
            .await
            .unwrap();

        assert_eq!(store.delete(jon.id).await.unwrap(), Some(jon.clone()));
        assert!(store.delete(jon.id).await.unwrap().is_none());
    }
}
