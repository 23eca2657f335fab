use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use tracing::instrument;

use crate::{
    error::ApiError,
    response::{ApiResponse, Message},
    state::AppState,
    users::{
        dto::{
            LoggedInUser, LoginRequest, PublicUser, RegisterRequest, RegisteredUser,
            UpdateUserRequest,
        },
        extractors::{OptionalJson, UserId},
        services,
    },
};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/user/:id", get(get_user).put(update_user))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> Result<ApiResponse<PublicUser>, ApiError> {
    let user = services::get_user(state.users.as_ref(), id).await?;
    Ok(ApiResponse::ok(user))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    OptionalJson(payload): OptionalJson<RegisterRequest>,
) -> Result<ApiResponse<RegisteredUser>, ApiError> {
    let payload = payload.ok_or(ApiError::MissingInput)?;
    let created = services::register(state.users.as_ref(), payload).await?;
    Ok(ApiResponse::created(created))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    OptionalJson(payload): OptionalJson<LoginRequest>,
) -> Result<ApiResponse<LoggedInUser>, ApiError> {
    let payload = payload.ok_or(ApiError::InvalidInput)?;
    let user = services::login(state.users.as_ref(), payload).await?;
    Ok(ApiResponse::ok(user))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    UserId(id): UserId,
    OptionalJson(payload): OptionalJson<UpdateUserRequest>,
) -> Result<ApiResponse<Message>, ApiError> {
    services::update_user(state.users.as_ref(), id, payload).await?;
    Ok(ApiResponse::ok(Message {
        message: "User updated successfully",
    }))
}
