use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::users::validation::{duplicate_email_message, FieldErrors};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error("{0} is already in use")]
    DuplicateEmail(String),

    #[error("No user found with given id")]
    NotFound,

    #[error("Supplied id is invalid")]
    InvalidId,

    #[error("{0}")]
    MalformedBody(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("password hashing error: {0}")]
    PasswordHash(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<FieldErrors> for UserError {
    fn from(errors: FieldErrors) -> Self {
        UserError::Validation(errors)
    }
}

impl From<mongodb::error::Error> for UserError {
    fn from(err: mongodb::error::Error) -> Self {
        UserError::Persistence(err.to_string())
    }
}

impl From<JsonRejection> for UserError {
    fn from(rejection: JsonRejection) -> Self {
        UserError::MalformedBody(rejection.body_text())
    }
}

impl From<QueryRejection> for UserError {
    fn from(rejection: QueryRejection) -> Self {
        UserError::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        match self {
            UserError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            UserError::DuplicateEmail(email) => {
                let mut errors = FieldErrors::new();
                errors.add("email", duplicate_email_message(&email));
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            UserError::NotFound | UserError::InvalidId => {
                (StatusCode::NOT_FOUND, self.to_string()).into_response()
            }
            UserError::MalformedBody(message) | UserError::Persistence(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
            }
            UserError::PasswordHash(message) => {
                tracing::error!(error = %message, "password hashing failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "An internal error occurred" })),
                )
                    .into_response()
            }
        }
    }
}
