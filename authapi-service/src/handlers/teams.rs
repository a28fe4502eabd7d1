use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use super::{load_organization, load_team, member_from};
use crate::{
    dtos::{
        organization::MemberRequest,
        team::{CreateTeamRequest, TeamResponse, UpdateTeamRequest},
        user::UserResponse,
    },
    middleware::MaybeUser,
    models::{Team, TeamChanges},
    services::{
        require,
        visibility::{team_visible, user_visible},
        Action, Scope,
    },
    utils::parse_validated,
    AppState,
};

pub(crate) async fn team_response(state: &AppState, team: Team) -> Result<TeamResponse, AppError> {
    let users: Vec<_> = state
        .store
        .team_users(team.id)
        .await?
        .into_iter()
        .filter(user_visible)
        .collect();
    let permissions = state.store.permissions_for_team(team.id).await?;
    Ok(TeamResponse::build(&state.links, team, &users, permissions))
}

/// Live teams of the organization; empty once the organization is archived.
#[utoipa::path(
    get,
    path = "/organizations/{org_id}/teams",
    params(("org_id" = i64, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Teams", body = [TeamResponse]),
        (status = 401, description = "Not authenticated", body = crate::dtos::ErrorResponse),
        (status = 404, description = "No such organization", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Teams"
)]
pub async fn list_teams(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(org_id): Path<i64>,
) -> Result<Json<Vec<TeamResponse>>, AppError> {
    let org = load_organization(state.store.as_ref(), org_id).await?;
    require(
        state.store.as_ref(),
        user.as_ref(),
        Action::Read,
        Scope::Organization(org.id),
    )
    .await?;

    let mut body = Vec::new();
    for team in state.store.teams_for_organization(org.id).await? {
        if team_visible(&team, &org) {
            body.push(team_response(&state, team).await?);
        }
    }
    Ok(Json(body))
}

#[utoipa::path(
    post,
    path = "/organizations/{org_id}/teams",
    params(("org_id" = i64, Path, description = "Organization id")),
    request_body = CreateTeamRequest,
    responses(
        (status = 201, description = "Team created", body = TeamResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not permitted", body = crate::dtos::ErrorResponse),
        (status = 404, description = "No such organization", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Teams"
)]
pub async fn create_team(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(org_id): Path<i64>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let org = load_organization(state.store.as_ref(), org_id).await?;
    require(
        state.store.as_ref(),
        user.as_ref(),
        Action::Write,
        Scope::Organization(org.id),
    )
    .await?;
    let req: CreateTeamRequest = parse_validated(&body)?;

    let team = state
        .store
        .insert_team(org.id, &req.title.unwrap_or_default())
        .await?;
    tracing::info!(org_id = org.id, team_id = team.id, "Team created");

    Ok((StatusCode::CREATED, Json(team_response(&state, team).await?)))
}

#[utoipa::path(
    get,
    path = "/organizations/{org_id}/teams/{team_id}",
    params(
        ("org_id" = i64, Path, description = "Organization id"),
        ("team_id" = i64, Path, description = "Team id")
    ),
    responses(
        (status = 200, description = "Team", body = TeamResponse),
        (status = 401, description = "Not authenticated", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Team not in this organization", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Teams"
)]
pub async fn get_team(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path((org_id, team_id)): Path<(i64, i64)>,
) -> Result<Json<TeamResponse>, AppError> {
    let (_, team) = load_team(state.store.as_ref(), org_id, team_id).await?;
    require(state.store.as_ref(), user.as_ref(), Action::Read, Scope::for_team(&team)).await?;

    Ok(Json(team_response(&state, team).await?))
}

#[utoipa::path(
    patch,
    path = "/organizations/{org_id}/teams/{team_id}",
    params(
        ("org_id" = i64, Path, description = "Organization id"),
        ("team_id" = i64, Path, description = "Team id")
    ),
    request_body = UpdateTeamRequest,
    responses(
        (status = 200, description = "Team updated", body = TeamResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not permitted", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Team not in this organization", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Teams"
)]
pub async fn update_team(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path((org_id, team_id)): Path<(i64, i64)>,
    body: Bytes,
) -> Result<Json<TeamResponse>, AppError> {
    let (_, team) = load_team(state.store.as_ref(), org_id, team_id).await?;
    require(state.store.as_ref(), user.as_ref(), Action::Write, Scope::for_team(&team)).await?;
    let req: UpdateTeamRequest = parse_validated(&body)?;

    let team = state
        .store
        .update_team(team.id, req.into())
        .await?
        .ok_or_else(|| AppError::not_found("Team"))?;
    tracing::info!(team_id = team.id, archived = team.archived, "Team updated");

    Ok(Json(team_response(&state, team).await?))
}

#[utoipa::path(
    delete,
    path = "/organizations/{org_id}/teams/{team_id}",
    params(
        ("org_id" = i64, Path, description = "Organization id"),
        ("team_id" = i64, Path, description = "Team id")
    ),
    responses(
        (status = 204, description = "Team archived"),
        (status = 403, description = "Not permitted", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Team not in this organization", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Teams"
)]
pub async fn archive_team(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path((org_id, team_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    let (_, team) = load_team(state.store.as_ref(), org_id, team_id).await?;
    require(state.store.as_ref(), user.as_ref(), Action::Admin, Scope::for_team(&team)).await?;

    state
        .store
        .update_team(
            team.id,
            TeamChanges {
                archived: Some(true),
                ..Default::default()
            },
        )
        .await?;
    tracing::info!(team_id = team.id, "Team archived");

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/organizations/{org_id}/teams/{team_id}/users",
    params(
        ("org_id" = i64, Path, description = "Organization id"),
        ("team_id" = i64, Path, description = "Team id")
    ),
    responses(
        (status = 200, description = "Active members", body = [UserResponse]),
        (status = 401, description = "Not authenticated", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Team not in this organization", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Teams"
)]
pub async fn list_team_users(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path((org_id, team_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let (_, team) = load_team(state.store.as_ref(), org_id, team_id).await?;
    require(state.store.as_ref(), user.as_ref(), Action::Read, Scope::for_team(&team)).await?;

    let users = state
        .store
        .team_users(team.id)
        .await?
        .into_iter()
        .filter(user_visible)
        .map(|u| UserResponse::build(&state.links, u))
        .collect();
    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/organizations/{org_id}/teams/{team_id}/users",
    params(
        ("org_id" = i64, Path, description = "Organization id"),
        ("team_id" = i64, Path, description = "Team id")
    ),
    request_body = MemberRequest,
    responses(
        (status = 204, description = "User added"),
        (status = 400, description = "Unknown or malformed user_id"),
        (status = 403, description = "Not permitted", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Team not in this organization", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Teams"
)]
pub async fn add_team_user(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path((org_id, team_id)): Path<(i64, i64)>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let (_, team) = load_team(state.store.as_ref(), org_id, team_id).await?;
    require(state.store.as_ref(), user.as_ref(), Action::Write, Scope::for_team(&team)).await?;
    let req: MemberRequest = parse_validated(&body)?;
    let member = member_from(state.store.as_ref(), req).await?;

    state.store.add_team_user(team.id, member.id).await?;
    tracing::info!(team_id = team.id, user_id = member.id, "Team member added");

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/organizations/{org_id}/teams/{team_id}/users/{user_id}",
    params(
        ("org_id" = i64, Path, description = "Organization id"),
        ("team_id" = i64, Path, description = "Team id"),
        ("user_id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 204, description = "User removed"),
        (status = 403, description = "Not permitted", body = crate::dtos::ErrorResponse),
        (status = 404, description = "Team not in this organization, or no such user", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Teams"
)]
pub async fn remove_team_user(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path((org_id, team_id, user_id)): Path<(i64, i64, i64)>,
) -> Result<StatusCode, AppError> {
    let (_, team) = load_team(state.store.as_ref(), org_id, team_id).await?;
    require(state.store.as_ref(), user.as_ref(), Action::Admin, Scope::for_team(&team)).await?;
    let member = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    state.store.remove_team_user(team.id, member.id).await?;
    tracing::info!(team_id = team.id, user_id = member.id, "Team member removed");

    Ok(StatusCode::NO_CONTENT)
}
