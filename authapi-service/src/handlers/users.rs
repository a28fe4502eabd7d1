use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::user::{CreateUserRequest, UpdateUserRequest, UserResponse},
    middleware::{AuthUser, MaybeUser},
    services::{require, visibility::user_visible, Action, Scope},
    utils::{parse_validated, Password},
    AppState,
};

/// Global admins only.
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not permitted", body = crate::dtos::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    require(state.store.as_ref(), user.as_ref(), Action::Admin, Scope::Global).await?;
    let req: CreateUserRequest = parse_validated(&body)?;

    let created = state
        .auth
        .create_user(
            &req.email.unwrap_or_default(),
            &Password::new(req.password.unwrap_or_default()),
            req.is_admin,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse::build(&state.links, created)),
    ))
}

/// Active users only.
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Users", body = [UserResponse]),
        (status = 401, description = "Not authenticated", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state
        .store
        .list_users()
        .await?
        .into_iter()
        .filter(user_visible)
        .map(|u| UserResponse::build(&state.links, u))
        .collect();
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}",
    params(("user_id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 401, description = "Not authenticated", body = crate::dtos::ErrorResponse),
        (status = 404, description = "No such user", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(Json(UserResponse::build(&state.links, user)))
}

/// Global admins only. Deactivating a user revokes their token on the next
/// request, since token resolution requires an active user.
#[utoipa::path(
    patch,
    path = "/users/{user_id}",
    params(("user_id" = i64, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 403, description = "Not permitted", body = crate::dtos::ErrorResponse),
        (status = 404, description = "No such user", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(user_id): Path<i64>,
    body: Bytes,
) -> Result<Json<UserResponse>, AppError> {
    require(state.store.as_ref(), user.as_ref(), Action::Admin, Scope::Global).await?;
    let req: UpdateUserRequest = parse_validated(&body)?;

    let updated = state
        .store
        .update_user(user_id, req.into())
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    tracing::info!(
        user_id = updated.id,
        is_active = updated.is_active,
        is_admin = updated.is_admin,
        "User updated"
    );

    Ok(Json(UserResponse::build(&state.links, updated)))
}
