use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, ProfileResponse, RegisterRequest},
        extractors::AuthContext,
        services,
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/profile", get(profile))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let res = services::register(state.users.as_ref(), &state.jwt, payload).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let res = services::login(state.users.as_ref(), &state.jwt, payload).await?;
    Ok(Json(res))
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<Json<ProfileResponse>, AppError> {
    let Some(user) = state.users.find_by_id(ctx.user_id).await? else {
        warn!(user_id = ctx.user_id, "profile for unknown user");
        return Err(AppError::not_found("User not found"));
    };
    Ok(Json(ProfileResponse { user: user.into() }))
}
