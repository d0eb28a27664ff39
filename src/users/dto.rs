use serde::{Deserialize, Serialize};

use crate::users::repo_types::User;

/// Request body for user creation.
///
/// Fields are optional on the wire so that a missing field is reported as a
/// validation error instead of a JSON rejection.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct NewUser {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
}

impl NewUser {
    /// Trims every field except the password.
    pub fn normalized(self) -> Self {
        Self {
            email: trimmed(self.email),
            password: self.password,
            first_name: trimmed(self.first_name),
            last_name: trimmed(self.last_name),
            city: trimmed(self.city),
        }
    }
}

/// Fields a general update may touch. A `password` key in the request body
/// is dropped during deserialization.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct UpdatableFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl UpdatableFields {
    pub fn normalized(self) -> Self {
        Self {
            email: trimmed(self.email),
            first_name: trimmed(self.first_name),
            last_name: trimmed(self.last_name),
            city: trimmed(self.city),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.city.is_none()
    }
}

/// Request body for the password endpoint; other keys are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct PasswordUpdate {
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// External view of a user. Carries no password material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_hex(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            city: user.city,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct UsersEnvelope {
    pub users: Vec<PublicUser>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}
