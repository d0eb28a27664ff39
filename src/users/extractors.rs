use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use mongodb::bson::oid::ObjectId;
use tracing::debug;

use crate::users::error::UserError;

/// The `:id` path segment parsed as a 24-char hex ObjectId.
///
/// Malformed ids are rejected with 404 `Supplied id is invalid` before the
/// handler runs, so no persistence call is made for them.
#[derive(Debug)]
pub struct ObjectIdPath(pub ObjectId);

#[async_trait]
impl<S> FromRequestParts<S> for ObjectIdPath
where
    S: Send + Sync,
{
    type Rejection = UserError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| UserError::InvalidId)?;

        let id = ObjectId::parse_str(&raw).map_err(|_| {
            debug!(id = %raw, "malformed object id");
            UserError::InvalidId
        })?;
        Ok(ObjectIdPath(id))
    }
}
