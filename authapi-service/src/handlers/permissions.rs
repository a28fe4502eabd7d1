use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use super::load_team;
use crate::{
    dtos::permission::{CreatePermissionRequest, PermissionResponse},
    middleware::MaybeUser,
    services::{require, Action, Scope},
    utils::parse_validated,
    AppState,
};

#[utoipa::path(
    get,
    path = "/organizations/{org_id}/teams/{team_id}/permissions",
    params(
        ("org_id" = i64, Path, description = "Organization id"),
        ("team_id" = i64, Path, description = "Team id")
    ),
    responses(
        (status = 200, description = "Permissions granted by the team", body = [PermissionResponse]),
        (status = 401, description = "Not authenticated", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Team not in this organization", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Permissions"
)]
pub async fn list_permissions(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path((org_id, team_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<PermissionResponse>>, AppError> {
    let (_, team) = load_team(state.store.as_ref(), org_id, team_id).await?;
    require(state.store.as_ref(), user.as_ref(), Action::Read, Scope::for_team(&team)).await?;

    let permissions = state.store.permissions_for_team(team.id).await?;
    Ok(Json(permissions.into_iter().map(Into::into).collect()))
}

/// Needs admin on the organization; `org:write` is not enough.
#[utoipa::path(
    post,
    path = "/organizations/{org_id}/teams/{team_id}/permissions",
    params(
        ("org_id" = i64, Path, description = "Organization id"),
        ("team_id" = i64, Path, description = "Team id")
    ),
    request_body = CreatePermissionRequest,
    responses(
        (status = 201, description = "Permission granted", body = PermissionResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not permitted", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Team not in this organization", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Permissions"
)]
pub async fn create_permission(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path((org_id, team_id)): Path<(i64, i64)>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let (_, team) = load_team(state.store.as_ref(), org_id, team_id).await?;
    require(state.store.as_ref(), user.as_ref(), Action::Admin, Scope::for_team(&team)).await?;
    let req: CreatePermissionRequest = parse_validated(&body)?;

    let permission = state
        .store
        .insert_permission(team.id, req.into_new_permission())
        .await?;
    tracing::info!(
        team_id = team.id,
        permission_id = permission.id,
        permission_type = %permission.permission_type,
        "Permission granted"
    );

    Ok((
        StatusCode::CREATED,
        Json(PermissionResponse::from(permission)),
    ))
}

#[utoipa::path(
    delete,
    path = "/organizations/{org_id}/teams/{team_id}/permissions/{permission_id}",
    params(
        ("org_id" = i64, Path, description = "Organization id"),
        ("team_id" = i64, Path, description = "Team id"),
        ("permission_id" = i64, Path, description = "Permission id")
    ),
    responses(
        (status = 204, description = "Permission revoked"),
        (status = 403, description = "Not permitted", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Permission not under this team", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Permissions"
)]
pub async fn delete_permission(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path((org_id, team_id, permission_id)): Path<(i64, i64, i64)>,
) -> Result<StatusCode, AppError> {
    let (_, team) = load_team(state.store.as_ref(), org_id, team_id).await?;
    require(state.store.as_ref(), user.as_ref(), Action::Admin, Scope::for_team(&team)).await?;
    let permission = state
        .store
        .find_permission(permission_id)
        .await?
        .filter(|p| p.team_id == team.id)
        .ok_or_else(|| AppError::not_found("Permission"))?;

    state.store.delete_permission(permission.id).await?;
    tracing::info!(team_id = team.id, permission_id = permission.id, "Permission revoked");

    Ok(StatusCode::NO_CONTENT)
}
