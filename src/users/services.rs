use mongodb::bson::oid::ObjectId;
use tracing::{instrument, warn};

use crate::users::dto::{NewUser, UpdatableFields};
use crate::users::error::{UserError, UserResult};
use crate::users::password::hash_password;
use crate::users::repo::UserStore;
use crate::users::repo_types::User;
use crate::users::validation::{
    duplicate_email_message, validate_new_user, validate_password, validate_update, FieldErrors,
};

/// Argon2 is CPU bound; keep it off the async workers.
async fn hash_off_thread(password: String) -> UserResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| UserError::PasswordHash(e.to_string()))?
}

fn reject(errors: FieldErrors) -> UserError {
    warn!(%errors, "user input rejected");
    UserError::from(errors)
}

#[instrument(skip(store, input))]
pub async fn create(store: &dyn UserStore, input: NewUser) -> UserResult<User> {
    let input = input.normalized();

    let mut errors = validate_new_user(&input).err().unwrap_or_default();
    if let Some(email) = input.email.as_deref() {
        if !errors.contains("email") && store.email_taken(email, None).await? {
            errors.add("email", duplicate_email_message(email));
        }
    }
    if !errors.is_empty() {
        return Err(reject(errors));
    }

    // every required field is present past validation
    let password_hash = hash_off_thread(input.password.unwrap_or_default()).await?;
    let user = User::new(
        input.email.unwrap_or_default(),
        password_hash,
        input.first_name.unwrap_or_default(),
        input.last_name.unwrap_or_default(),
        input.city,
    );
    store.insert(user).await
}

#[instrument(skip(store, changes))]
pub async fn update(
    store: &dyn UserStore,
    id: ObjectId,
    changes: UpdatableFields,
) -> UserResult<User> {
    let changes = changes.normalized();

    let mut errors = validate_update(&changes).err().unwrap_or_default();
    if let Some(email) = changes.email.as_deref() {
        if !errors.contains("email") && store.email_taken(email, Some(id)).await? {
            errors.add("email", duplicate_email_message(email));
        }
    }
    if !errors.is_empty() {
        return Err(reject(errors));
    }

    store
        .update_fields(id, &changes)
        .await?
        .ok_or(UserError::NotFound)
}

#[instrument(skip(store, password))]
pub async fn update_password(
    store: &dyn UserStore,
    id: ObjectId,
    password: Option<String>,
) -> UserResult<User> {
    validate_password(password.as_deref()).map_err(reject)?;
    if store.find_by_id(id).await?.is_none() {
        return Err(UserError::NotFound);
    }

    let password_hash = hash_off_thread(password.unwrap_or_default()).await?;
    store
        .set_password_hash(id, &password_hash)
        .await?
        .ok_or(UserError::NotFound)
}

pub async fn find_by_id(store: &dyn UserStore, id: ObjectId) -> UserResult<User> {
    store.find_by_id(id).await?.ok_or(UserError::NotFound)
}

pub async fn find_all(store: &dyn UserStore, search: Option<&str>) -> UserResult<Vec<User>> {
    store.find_all(search).await
}

#[instrument(skip(store))]
pub async fn remove(store: &dyn UserStore, id: ObjectId) -> UserResult<User> {
    store.delete(id).await?.ok_or(UserError::NotFound)
}
