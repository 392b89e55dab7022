//! The store boundary: a dependency-injected handle created once at
//! startup and shared by every request.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use thiserror::Error;

use crate::model::{NewUser, Position, User, UserPatch};

pub use memory::MemoryUserStore;
pub use mongo::MongoUserStore;

pub type SharedStore = Arc<dyn UserStore>;

/// Conjunction of the optional list constraints. An empty filter matches
/// every user.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UserFilter {
    /// Matches users whose gpa is greater than or equal to this value.
    pub min_gpa: Option<f64>,
    /// Matches users holding exactly this position.
    pub position: Option<Position>,
    /// Matches users with exactly this many years of experience.
    pub experience: Option<i64>,
}

impl UserFilter {
    pub fn is_empty(&self) -> bool {
        self.min_gpa.is_none() && self.position.is_none() && self.experience.is_none()
    }
}

/// Errors surfaced by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already in use")]
    DuplicateEmail,

    #[error(transparent)]
    Backend(#[from] mongodb::error::Error),
}

/// Persistence operations for user records.
///
/// Implementations assign ids and maintain `created_at`/`updated_at`;
/// callers never supply either.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// All users matching the filter, unordered.
    async fn find(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Persist a new record. Fails with [`StoreError::DuplicateEmail`] when
    /// the email is already taken.
    async fn insert(&self, data: NewUser) -> Result<User, StoreError>;

    /// Apply the present fields of `patch` and refresh `updated_at`.
    /// Returns `None` when no record exists at `id`.
    async fn update_by_id(&self, id: ObjectId, patch: UserPatch)
        -> Result<Option<User>, StoreError>;

    /// Returns whether a record was removed.
    async fn delete_by_id(&self, id: ObjectId) -> Result<bool, StoreError>;

    /// Liveness probe for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
