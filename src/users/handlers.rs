use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::{AdminUser, AuthContext},
    error::AppError,
    state::AppState,
    users::{
        dto::{DeletedUserResponse, UpdateUserRequest, UpdatedUserResponse, UserListResponse, UserResponse},
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<UserListResponse>, AppError> {
    let users = state.users.list().await?;
    Ok(Json(UserListResponse {
        users: users.into_iter().map(Into::into).collect(),
    }))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    let user = services::get_user(state.users.as_ref(), &ctx, id).await?;
    Ok(Json(UserResponse { user: user.into() }))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UpdatedUserResponse>, AppError> {
    let user = services::update_user(state.users.as_ref(), &ctx, id, payload).await?;
    Ok(Json(UpdatedUserResponse {
        message: "User updated successfully".into(),
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i32>,
) -> Result<Json<DeletedUserResponse>, AppError> {
    services::delete_user(state.users.as_ref(), id).await?;
    Ok(Json(DeletedUserResponse {
        message: "User deleted successfully".into(),
        id,
    }))
}
