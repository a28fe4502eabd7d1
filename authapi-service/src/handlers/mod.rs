//! HTTP handlers.
//!
//! Nested routes resolve their parents first: a team that is not under the
//! organization in the path, or a permission not under the team, is a 404.

pub mod health;
pub mod organizations;
pub mod permissions;
pub mod teams;
pub mod tokens;
pub mod users;

use service_core::error::AppError;

use crate::{
    dtos::organization::MemberRequest,
    models::{Organization, Team, User},
    services::Store,
    utils::{missing_pk, parse_pk},
};

pub(crate) async fn load_organization(
    store: &dyn Store,
    org_id: i64,
) -> Result<Organization, AppError> {
    store
        .find_organization(org_id)
        .await?
        .ok_or_else(|| AppError::not_found("Organization"))
}

pub(crate) async fn load_team(
    store: &dyn Store,
    org_id: i64,
    team_id: i64,
) -> Result<(Organization, Team), AppError> {
    let org = load_organization(store, org_id).await?;
    let team = store
        .find_team(team_id)
        .await?
        .filter(|team| team.organization_id == org.id)
        .ok_or_else(|| AppError::not_found("Team"))?;
    Ok((org, team))
}

/// The user named by a membership body's `user_id`.
pub(crate) async fn member_from(store: &dyn Store, req: MemberRequest) -> Result<User, AppError> {
    let raw = req.user_id.unwrap_or_default();
    let user_id = parse_pk("user_id", &raw)?;
    store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| missing_pk("user_id", user_id))
}
