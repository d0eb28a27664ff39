use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{get, patch},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    state::AppState,
    users::{
        dto::{
            NewUser, PasswordUpdate, PublicUser, SearchQuery, UpdatableFields, UserEnvelope,
            UsersEnvelope,
        },
        error::UserResult,
        extractors::ObjectIdPath,
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/users/:id/password", patch(update_password))
}

/// GET /users/:id
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    ObjectIdPath(id): ObjectIdPath,
) -> UserResult<Json<UserEnvelope>> {
    let user = services::find_by_id(state.users.as_ref(), id).await?;
    Ok(Json(UserEnvelope { user: user.into() }))
}

/// GET /users?search=
#[instrument(skip(state, query))]
pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> UserResult<Json<UsersEnvelope>> {
    let Query(query) = query?;
    let users = services::find_all(state.users.as_ref(), query.search.as_deref()).await?;
    Ok(Json(UsersEnvelope {
        users: users.into_iter().map(PublicUser::from).collect(),
    }))
}

/// POST /users. Answers with the bare record, not an envelope.
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> UserResult<Json<PublicUser>> {
    let Json(input) = payload?;
    let user = services::create(state.users.as_ref(), input).await?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(user.into()))
}

/// PATCH /users/:id
#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    ObjectIdPath(id): ObjectIdPath,
    payload: Result<Json<UpdatableFields>, JsonRejection>,
) -> UserResult<Json<UserEnvelope>> {
    let Json(changes) = payload?;
    let user = services::update(state.users.as_ref(), id, changes).await?;
    Ok(Json(UserEnvelope { user: user.into() }))
}

/// PATCH /users/:id/password
#[instrument(skip(state, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    ObjectIdPath(id): ObjectIdPath,
    payload: Result<Json<PasswordUpdate>, JsonRejection>,
) -> UserResult<Json<UserEnvelope>> {
    let Json(body) = payload?;
    let user = services::update_password(state.users.as_ref(), id, body.password).await?;
    Ok(Json(UserEnvelope { user: user.into() }))
}

/// DELETE /users/:id
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    ObjectIdPath(id): ObjectIdPath,
) -> UserResult<Json<UserEnvelope>> {
    let user = services::remove(state.users.as_ref(), id).await?;
    Ok(Json(UserEnvelope { user: user.into() }))
}
