use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::auth::{CurrentUserResponse, TokenRequest, TokenResponse},
    middleware::AuthUser,
    services::resolve_effective_permissions,
    utils::{Password, ValidatedJson},
    AppState,
};

/// Exchange email and password for a token. Any previous token of the user
/// stops working.
#[utoipa::path(
    post,
    path = "/user/tokens",
    request_body = TokenRequest,
    responses(
        (status = 201, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid credentials", body = crate::dtos::ErrorResponse),
        (status = 403, description = "User is inactive", body = crate::dtos::ErrorResponse),
        (status = 429, description = "Too many attempts", body = crate::dtos::ErrorResponse)
    ),
    tag = "Tokens"
)]
pub async fn create_token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<TokenRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = req.email.unwrap_or_default();
    let password = Password::new(req.password.unwrap_or_default());

    let issued = state.auth.issue_token(&email, &password).await?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse { token: issued.key }),
    ))
}

/// The caller's effective permissions.
#[utoipa::path(
    get,
    path = "/user",
    responses(
        (status = 200, description = "Current user", body = CurrentUserResponse),
        (status = 401, description = "Not authenticated", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Tokens"
)]
pub async fn current_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<CurrentUserResponse>, AppError> {
    let permissions = resolve_effective_permissions(state.store.as_ref(), &user).await?;

    Ok(Json(CurrentUserResponse {
        id: user.id,
        email: user.email,
        permissions: permissions.into_iter().map(Into::into).collect(),
    }))
}
