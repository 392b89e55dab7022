//! In-process store used as the test double behind [`UserStore`].
//!
//! Mirrors the MongoDB backend's observable behavior, including the
//! unique-email guard on insert and update.

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use std::sync::{PoisonError, RwLock};

use crate::model::{NewUser, User, UserPatch};
use crate::store::{StoreError, UserFilter, UserStore};

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(user: &User, filter: &UserFilter) -> bool {
        filter.min_gpa.map_or(true, |min| user.gpa >= min)
            && filter.position.map_or(true, |position| user.position == position)
            && filter
                .experience
                .map_or(true, |experience| user.experience == experience as f64)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users
            .iter()
            .filter(|user| Self::matches(user, filter))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, StoreError> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
        Ok(users.iter().find(|user| user.email == email).cloned())
    }

    async fn insert(&self, data: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        if users.iter().any(|user| user.email == data.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let now = Utc::now();
        let user = User {
            id: ObjectId::new(),
            name: data.name,
            age: data.age,
            email: data.email,
            position: data.position,
            gpa: data.gpa,
            experience: data.experience,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_by_id(
        &self,
        id: ObjectId,
        patch: UserPatch,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(email) = patch.email.as_deref() {
            if users.iter().any(|user| user.id != id && user.email == email) {
                return Err(StoreError::DuplicateEmail);
            }
        }

        let Some(user) = users.iter_mut().find(|user| user.id == id) else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(age) = patch.age {
            user.age = Some(age);
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(position) = patch.position {
            user.position = position;
        }
        if let Some(gpa) = patch.gpa {
            user.gpa = gpa;
        }
        if let Some(experience) = patch.experience {
            user.experience = experience;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_by_id(&self, id: ObjectId) -> Result<bool, StoreError> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let before = users.len();
        users.retain(|user| user.id != id);
        Ok(users.len() < before)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;

    fn sample(email: &str, gpa: f64, position: Position, experience: f64) -> NewUser {
        NewUser {
            name: "Test User".to_string(),
            age: None,
            email: email.to_string(),
            position,
            gpa,
            experience,
        }
    }

    #[tokio::test]
    async fn find_applies_the_conjunction_of_constraints() {
        let store = MemoryUserStore::new();
        store
            .insert(sample("a@example.com", 3.9, Position::SoftwareEngineer, 2.0))
            .await
            .unwrap();
        store
            .insert(sample("b@example.com", 3.0, Position::SoftwareEngineer, 2.0))
            .await
            .unwrap();
        store
            .insert(sample("c@example.com", 3.9, Position::MlEngineer, 5.0))
            .await
            .unwrap();

        let filter = UserFilter {
            min_gpa: Some(3.5),
            position: Some(Position::SoftwareEngineer),
            experience: Some(2),
        };
        let found = store.find(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].email, "a@example.com");

        let all = store.find(&UserFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_emails() {
        let store = MemoryUserStore::new();
        store
            .insert(sample("dup@example.com", 3.0, Position::MlEngineer, 1.0))
            .await
            .unwrap();
        let error = store
            .insert(sample("dup@example.com", 3.5, Position::MlEngineer, 2.0))
            .await
            .unwrap_err();
        assert!(matches!(error, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn update_applies_only_present_fields() {
        let store = MemoryUserStore::new();
        let user = store
            .insert(sample("u@example.com", 3.0, Position::UiUxDesigner, 1.0))
            .await
            .unwrap();

        let patch = UserPatch {
            gpa: Some(3.8),
            ..Default::default()
        };
        let updated = store.update_by_id(user.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.gpa, 3.8);
        assert_eq!(updated.email, "u@example.com");
        assert_eq!(updated.position, Position::UiUxDesigner);
        assert!(updated.updated_at >= user.updated_at);

        let missing = store
            .update_by_id(ObjectId::new(), UserPatch::default())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn delete_reports_whether_a_record_was_removed() {
        let store = MemoryUserStore::new();
        let user = store
            .insert(sample("d@example.com", 2.5, Position::MlEngineer, 1.0))
            .await
            .unwrap();

        assert!(store.delete_by_id(user.id).await.unwrap());
        assert!(!store.delete_by_id(user.id).await.unwrap());
        assert!(store.find_by_id(user.id).await.unwrap().is_none());
    }
}
