use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use super::{load_organization, member_from};
use crate::{
    dtos::{
        organization::{
            CreateOrganizationRequest, MemberRequest, OrganizationListQuery,
            OrganizationResponse, UpdateOrganizationRequest,
        },
        user::UserResponse,
    },
    middleware::MaybeUser,
    models::{Organization, OrganizationChanges},
    services::{
        require,
        visibility::{team_visible, user_visible},
        Action, ArchivedFilter, Scope,
    },
    utils::parse_validated,
    AppState,
};

pub(crate) async fn organization_response(
    state: &AppState,
    org: Organization,
) -> Result<OrganizationResponse, AppError> {
    let users: Vec<_> = state
        .store
        .organization_users(org.id)
        .await?
        .into_iter()
        .filter(user_visible)
        .collect();
    let teams: Vec<_> = state
        .store
        .teams_for_organization(org.id)
        .await?
        .into_iter()
        .filter(|team| team_visible(team, &org))
        .collect();
    Ok(OrganizationResponse::build(&state.links, org, &users, &teams))
}

#[utoipa::path(
    get,
    path = "/organizations",
    params(OrganizationListQuery),
    responses(
        (status = 200, description = "Organizations", body = [OrganizationResponse]),
        (status = 400, description = "Invalid archived filter")
    ),
    tag = "Organizations"
)]
pub async fn list_organizations(
    State(state): State<AppState>,
    Query(query): Query<OrganizationListQuery>,
) -> Result<Json<Vec<OrganizationResponse>>, AppError> {
    let filter = ArchivedFilter::parse(query.archived.as_deref())?;

    let mut body = Vec::new();
    for org in state.store.list_organizations(filter).await? {
        body.push(organization_response(&state, org).await?);
    }
    Ok(Json(body))
}

#[utoipa::path(
    post,
    path = "/organizations",
    request_body = CreateOrganizationRequest,
    responses(
        (status = 201, description = "Organization created", body = OrganizationResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Not authenticated", body = crate::dtos::ErrorResponse),
        (status = 403, description = "Not permitted", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Organizations"
)]
pub async fn create_organization(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    require(state.store.as_ref(), user.as_ref(), Action::Write, Scope::Global).await?;
    let req: CreateOrganizationRequest = parse_validated(&body)?;

    let org = state
        .store
        .insert_organization(&req.title.unwrap_or_default())
        .await?;
    tracing::info!(org_id = org.id, "Organization created");

    Ok((StatusCode::CREATED, Json(organization_response(&state, org).await?)))
}

#[utoipa::path(
    get,
    path = "/organizations/{org_id}",
    params(("org_id" = i64, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Organization, archived or not", body = OrganizationResponse),
        (status = 404, description = "No such organization", body = crate::dtos::ErrorResponse)
    ),
    tag = "Organizations"
)]
pub async fn get_organization(
    State(state): State<AppState>,
    Path(org_id): Path<i64>,
) -> Result<Json<OrganizationResponse>, AppError> {
    let org = load_organization(state.store.as_ref(), org_id).await?;
    Ok(Json(organization_response(&state, org).await?))
}

#[utoipa::path(
    patch,
    path = "/organizations/{org_id}",
    params(("org_id" = i64, Path, description = "Organization id")),
    request_body = UpdateOrganizationRequest,
    responses(
        (status = 200, description = "Organization updated", body = OrganizationResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not permitted", body = crate::dtos::ErrorResponse),
        (status = 404, description = "No such organization", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Organizations"
)]
pub async fn update_organization(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(org_id): Path<i64>,
    body: Bytes,
) -> Result<Json<OrganizationResponse>, AppError> {
    let org = load_organization(state.store.as_ref(), org_id).await?;
    require(
        state.store.as_ref(),
        user.as_ref(),
        Action::Write,
        Scope::Organization(org.id),
    )
    .await?;
    let req: UpdateOrganizationRequest = parse_validated(&body)?;

    let org = state
        .store
        .update_organization(org.id, req.into())
        .await?
        .ok_or_else(|| AppError::not_found("Organization"))?;
    tracing::info!(org_id = org.id, archived = org.archived, "Organization updated");

    Ok(Json(organization_response(&state, org).await?))
}

/// Archives; the row and its teams are kept.
#[utoipa::path(
    delete,
    path = "/organizations/{org_id}",
    params(("org_id" = i64, Path, description = "Organization id")),
    responses(
        (status = 204, description = "Organization archived"),
        (status = 403, description = "Not permitted", body = crate::dtos::ErrorResponse),
        (status = 404, description = "No such organization", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Organizations"
)]
pub async fn archive_organization(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(org_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let org = load_organization(state.store.as_ref(), org_id).await?;
    require(
        state.store.as_ref(),
        user.as_ref(),
        Action::Admin,
        Scope::Organization(org.id),
    )
    .await?;

    state
        .store
        .update_organization(
            org.id,
            OrganizationChanges {
                archived: Some(true),
                ..Default::default()
            },
        )
        .await?;
    tracing::info!(org_id = org.id, "Organization archived");

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/organizations/{org_id}/users",
    params(("org_id" = i64, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Active members", body = [UserResponse]),
        (status = 401, description = "Not authenticated", body = crate::dtos::ErrorResponse),
        (status = 404, description = "No such organization", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Organizations"
)]
pub async fn list_organization_users(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(org_id): Path<i64>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let org = load_organization(state.store.as_ref(), org_id).await?;
    require(
        state.store.as_ref(),
        user.as_ref(),
        Action::Read,
        Scope::Organization(org.id),
    )
    .await?;

    let users = state
        .store
        .organization_users(org.id)
        .await?
        .into_iter()
        .filter(user_visible)
        .map(|u| UserResponse::build(&state.links, u))
        .collect();
    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/organizations/{org_id}/users",
    params(("org_id" = i64, Path, description = "Organization id")),
    request_body = MemberRequest,
    responses(
        (status = 204, description = "User added"),
        (status = 400, description = "Unknown or malformed user_id"),
        (status = 403, description = "Not permitted", body = crate::dtos::ErrorResponse),
        (status = 404, description = "No such organization", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Organizations"
)]
pub async fn add_organization_user(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(org_id): Path<i64>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let org = load_organization(state.store.as_ref(), org_id).await?;
    require(
        state.store.as_ref(),
        user.as_ref(),
        Action::Write,
        Scope::Organization(org.id),
    )
    .await?;
    let req: MemberRequest = parse_validated(&body)?;
    let member = member_from(state.store.as_ref(), req).await?;

    state.store.add_organization_user(org.id, member.id).await?;
    tracing::info!(org_id = org.id, user_id = member.id, "Organization member added");

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/organizations/{org_id}/users/{user_id}",
    params(
        ("org_id" = i64, Path, description = "Organization id"),
        ("user_id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 204, description = "User removed"),
        (status = 403, description = "Not permitted", body = crate::dtos::ErrorResponse),
        (status = 404, description = "No such organization or user", body = crate::dtos::ErrorResponse)
    ),
    security(("token" = [])),
    tag = "Organizations"
)]
pub async fn remove_organization_user(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path((org_id, user_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    let org = load_organization(state.store.as_ref(), org_id).await?;
    require(
        state.store.as_ref(),
        user.as_ref(),
        Action::Admin,
        Scope::Organization(org.id),
    )
    .await?;
    let member = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    state.store.remove_organization_user(org.id, member.id).await?;
    tracing::info!(org_id = org.id, user_id = member.id, "Organization member removed");

    Ok(StatusCode::NO_CONTENT)
}
