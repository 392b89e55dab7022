//! MongoDB-backed store.

use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};

use crate::config::AppConfig;
use crate::model::{NewUser, User, UserPatch};
use crate::store::{StoreError, UserFilter, UserStore};

pub struct MongoUserStore {
    database: Database,
    users: Collection<User>,
}

impl MongoUserStore {
    /// Connect to the database named by the configuration and prepare the
    /// `users` collection. Called once at startup; any failure here is
    /// fatal to the process.
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let client = Client::with_uri_str(&config.mongodb_uri).await?;
        let database = match &config.mongodb_database {
            Some(name) => client.database(name),
            None => client.default_database().ok_or_else(|| {
                anyhow::anyhow!("MONGODB_URI must name a database, or set MONGODB_DATABASE")
            })?,
        };

        // Fail startup early if the server is unreachable.
        database.run_command(doc! { "ping": 1 }, None).await?;

        let users = database.collection::<User>("users");

        // Concurrent creates can both pass the handler's email check; the
        // unique index is the authoritative guard.
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        users.create_index(index, None).await?;

        tracing::info!(database = %database.name(), "connected to MongoDB");
        Ok(Self { database, users })
    }

    fn filter_document(filter: &UserFilter) -> Document {
        let mut document = Document::new();
        if let Some(min_gpa) = filter.min_gpa {
            document.insert("gpa", doc! { "$gte": min_gpa });
        }
        if let Some(position) = filter.position {
            document.insert("position", position.as_str());
        }
        if let Some(experience) = filter.experience {
            document.insert("experience", experience);
        }
        document
    }

    fn set_document(patch: &UserPatch) -> Document {
        let mut set = Document::new();
        if let Some(name) = &patch.name {
            set.insert("name", name.as_str());
        }
        if let Some(age) = patch.age {
            set.insert("age", age);
        }
        if let Some(email) = &patch.email {
            set.insert("email", email.as_str());
        }
        if let Some(position) = patch.position {
            set.insert("position", position.as_str());
        }
        if let Some(gpa) = patch.gpa {
            set.insert("gpa", gpa);
        }
        if let Some(experience) = patch.experience {
            set.insert("experience", experience);
        }
        set
    }
}

fn duplicate_key_to_store_error(error: mongodb::error::Error) -> StoreError {
    if is_duplicate_key(&error) {
        StoreError::DuplicateEmail
    } else {
        StoreError::Backend(error)
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        ErrorKind::Command(command_error) => command_error.code == 11000,
        _ => false,
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        let cursor = self.users.find(Self::filter_document(filter), None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, StoreError> {
        Ok(self.users.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.find_one(doc! { "email": email }, None).await?)
    }

    async fn insert(&self, data: NewUser) -> Result<User, StoreError> {
        let id = ObjectId::new();
        let now = Utc::now();

        let mut document = doc! {
            "_id": id,
            "name": data.name.as_str(),
            "email": data.email.as_str(),
            "position": data.position.as_str(),
            "gpa": data.gpa,
            "experience": data.experience,
            "createdAt": DateTime::from_chrono(now),
            "updatedAt": DateTime::from_chrono(now),
        };
        if let Some(age) = data.age {
            document.insert("age", age);
        }

        self.users
            .clone_with_type::<Document>()
            .insert_one(document, None)
            .await
            .map_err(duplicate_key_to_store_error)?;

        Ok(User {
            id,
            name: data.name,
            age: data.age,
            email: data.email,
            position: data.position,
            gpa: data.gpa,
            experience: data.experience,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_by_id(
        &self,
        id: ObjectId,
        patch: UserPatch,
    ) -> Result<Option<User>, StoreError> {
        let mut set = Self::set_document(&patch);
        set.insert("updatedAt", DateTime::now());

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.users
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
            .await
            .map_err(duplicate_key_to_store_error)
    }

    async fn delete_by_id(&self, id: ObjectId) -> Result<bool, StoreError> {
        let result = self.users.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Position;

    #[test]
    fn filter_document_holds_only_present_constraints() {
        let empty = MongoUserStore::filter_document(&UserFilter::default());
        assert!(empty.is_empty());

        let filter = UserFilter {
            min_gpa: Some(3.5),
            position: Some(Position::UiUxDesigner),
            experience: Some(2),
        };
        let document = MongoUserStore::filter_document(&filter);
        assert_eq!(document.get_document("gpa").unwrap(), &doc! { "$gte": 3.5 });
        assert_eq!(document.get_str("position").unwrap(), "UI/UX Designer");
        assert_eq!(document.get_i64("experience").unwrap(), 2);
    }

    #[test]
    fn set_document_skips_absent_fields() {
        let patch = UserPatch {
            name: Some("Grace".to_string()),
            gpa: Some(3.9),
            ..Default::default()
        };
        let set = MongoUserStore::set_document(&patch);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get_str("name").unwrap(), "Grace");
        assert_eq!(set.get_f64("gpa").unwrap(), 3.9);
    }
}
