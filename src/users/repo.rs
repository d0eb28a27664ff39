use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, to_document, Document},
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use tracing::{error, info, instrument};

use crate::users::dto::UpdatableFields;
use crate::users::error::{UserError, UserResult};
use crate::users::repo_types::{User, SEARCHABLE_FIELDS};

const COLLECTION: &str = "users";
const DUPLICATE_KEY: i32 = 11000;

/// Persistence handle for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a fully built record. Fails with `DuplicateEmail` on a taken email.
    async fn insert(&self, user: User) -> UserResult<User>;

    async fn find_by_id(&self, id: ObjectId) -> UserResult<Option<User>>;

    /// All records, or those whose searchable fields contain `search` (case-insensitive).
    async fn find_all(&self, search: Option<&str>) -> UserResult<Vec<User>>;

    /// Whether a record other than `except` already uses `email`.
    async fn email_taken(&self, email: &str, except: Option<ObjectId>) -> UserResult<bool>;

    /// Set the supplied fields and return the updated record, `None` if `id` is unknown.
    async fn update_fields(
        &self,
        id: ObjectId,
        changes: &UpdatableFields,
    ) -> UserResult<Option<User>>;

    async fn set_password_hash(
        &self,
        id: ObjectId,
        password_hash: &str,
    ) -> UserResult<Option<User>>;

    /// Remove and return the record, `None` if `id` is unknown.
    async fn delete(&self, id: ObjectId) -> UserResult<Option<User>>;
}

/// `UserStore` over the MongoDB `users` collection.
#[derive(Clone)]
pub struct MongoUserStore {
    collection: Collection<User>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<User>(COLLECTION),
        }
    }

    /// Unique email index; backs the uniqueness invariant under concurrent writes.
    pub async fn init_indexes(&self) -> UserResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("idx_email_unique".to_string())
                    .build(),
            )
            .build();
        self.collection.create_index(index).await?;
        info!("user indexes ready");
        Ok(())
    }

    fn search_filter(search: Option<&str>) -> Document {
        let Some(search) = search.filter(|s| !s.is_empty()) else {
            return doc! {};
        };
        let pattern = regex::escape(search);
        let clauses: Vec<Document> = SEARCHABLE_FIELDS
            .iter()
            .map(|field| {
                let mut clause = Document::new();
                clause.insert(*field, doc! { "$regex": pattern.as_str(), "$options": "i" });
                clause
            })
            .collect();
        doc! { "$or": clauses }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn map_write_err(err: mongodb::error::Error, email: &str) -> UserError {
    if is_duplicate_key(&err) {
        UserError::DuplicateEmail(email.to_string())
    } else {
        error!(error = %err, "mongodb write failed");
        UserError::from(err)
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn insert(&self, user: User) -> UserResult<User> {
        self.collection
            .insert_one(&user)
            .await
            .map_err(|e| map_write_err(e, &user.email))?;
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: ObjectId) -> UserResult<Option<User>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    #[instrument(skip(self))]
    async fn find_all(&self, search: Option<&str>) -> UserResult<Vec<User>> {
        let cursor = self
            .collection
            .find(Self::search_filter(search))
            .sort(doc! { "_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self, email))]
    async fn email_taken(&self, email: &str, except: Option<ObjectId>) -> UserResult<bool> {
        let mut filter = doc! { "email": email };
        if let Some(id) = except {
            filter.insert("_id", doc! { "$ne": id });
        }
        Ok(self.collection.find_one(filter).await?.is_some())
    }

    #[instrument(skip(self, changes))]
    async fn update_fields(
        &self,
        id: ObjectId,
        changes: &UpdatableFields,
    ) -> UserResult<Option<User>> {
        if changes.is_empty() {
            return self.find_by_id(id).await;
        }
        let set = to_document(changes).map_err(|e| UserError::Persistence(e.to_string()))?;
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| map_write_err(e, changes.email.as_deref().unwrap_or_default()))?;
        if updated.is_some() {
            info!(user_id = %id, "user updated");
        }
        Ok(updated)
    }

    #[instrument(skip(self, password_hash))]
    async fn set_password_hash(
        &self,
        id: ObjectId,
        password_hash: &str,
    ) -> UserResult<Option<User>> {
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "password": password_hash } },
            )
            .return_document(ReturnDocument::After)
            .await?;
        if updated.is_some() {
            info!(user_id = %id, "user password updated");
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ObjectId) -> UserResult<Option<User>> {
        let deleted = self
            .collection
            .find_one_and_delete(doc! { "_id": id })
            .await?;
        if deleted.is_some() {
            info!(user_id = %id, "user deleted");
        }
        Ok(deleted)
    }
}
