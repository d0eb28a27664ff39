use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[cfg(test)]
use crate::users::dto::UpdatableFields;

/// Document fields eligible for substring search.
pub const SEARCHABLE_FIELDS: [&str; 4] = ["email", "first_name", "last_name", "city"];

/// User document as stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    #[serde(rename = "password")]
    pub password_hash: String, // argon2 PHC string
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl User {
    /// Builds a record with a fresh identifier. The password must already be hashed.
    pub fn new(
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
        city: Option<String>,
    ) -> Self {
        Self {
            id: ObjectId::new(),
            email,
            password_hash,
            first_name,
            last_name,
            city,
        }
    }

    /// In-process equivalent of the `$set` issued by the Mongo store.
    #[cfg(test)]
    pub fn apply(&mut self, changes: &UpdatableFields) {
        if let Some(email) = &changes.email {
            self.email = email.clone();
        }
        if let Some(first_name) = &changes.first_name {
            self.first_name = first_name.clone();
        }
        if let Some(last_name) = &changes.last_name {
            self.last_name = last_name.clone();
        }
        if let Some(city) = &changes.city {
            self.city = Some(city.clone());
        }
    }
}
