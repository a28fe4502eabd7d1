use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{Links, ResourceRef};
use crate::models::{Organization, OrganizationChanges, Team, User};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrganizationListQuery {
    /// One of `true`, `false`, `both`; defaults to `false`.
    #[param(example = "both")]
    pub archived: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrganizationResponse {
    pub url: String,
    pub id: i64,
    #[schema(example = "Acme")]
    pub title: String,
    pub archived: bool,
    /// Active members only.
    pub users: Vec<ResourceRef>,
    /// Non-archived teams only.
    pub teams: Vec<ResourceRef>,
}

impl OrganizationResponse {
    /// `users` and `teams` are expected to be filtered already.
    pub fn build(links: &Links, org: Organization, users: &[User], teams: &[Team]) -> Self {
        Self {
            url: links.organization(org.id).url,
            id: org.id,
            title: org.title,
            archived: org.archived,
            users: users.iter().map(|u| links.user(u.id)).collect(),
            teams: teams.iter().map(|t| links.team(t.organization_id, t.id)).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrganizationRequest {
    #[serde(default, deserialize_with = "crate::utils::trimmed")]
    #[validate(
        required(message = "This field is required."),
        length(min = 1, message = "This field may not be blank.")
    )]
    #[schema(example = "Acme")]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateOrganizationRequest {
    #[serde(default, deserialize_with = "crate::utils::trimmed")]
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub title: Option<String>,
    /// `true` archives, `false` restores.
    pub archived: Option<bool>,
}

impl From<UpdateOrganizationRequest> for OrganizationChanges {
    fn from(req: UpdateOrganizationRequest) -> Self {
        Self {
            title: req.title,
            archived: req.archived,
        }
    }
}

/// Body for adding a member to an organization or team.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MemberRequest {
    #[validate(required(message = "This field is required."))]
    #[schema(value_type = Option<i64>, example = 7)]
    pub user_id: Option<serde_json::Value>,
}
