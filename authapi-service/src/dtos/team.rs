use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{permission::PermissionResponse, Links, ResourceRef};
use crate::models::{Permission, Team, TeamChanges, User};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TeamResponse {
    pub url: String,
    pub id: i64,
    #[schema(example = "Operations")]
    pub title: String,
    pub archived: bool,
    pub organization: ResourceRef,
    /// Active members only.
    pub users: Vec<ResourceRef>,
    pub permissions: Vec<PermissionResponse>,
}

impl TeamResponse {
    pub fn build(links: &Links, team: Team, users: &[User], permissions: Vec<Permission>) -> Self {
        Self {
            url: links.team(team.organization_id, team.id).url,
            id: team.id,
            title: team.title,
            archived: team.archived,
            organization: links.organization(team.organization_id),
            users: users.iter().map(|u| links.user(u.id)).collect(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTeamRequest {
    #[serde(default, deserialize_with = "crate::utils::trimmed")]
    #[validate(
        required(message = "This field is required."),
        length(min = 1, message = "This field may not be blank.")
    )]
    #[schema(example = "Operations")]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTeamRequest {
    #[serde(default, deserialize_with = "crate::utils::trimmed")]
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub title: Option<String>,
    pub archived: Option<bool>,
}

impl From<UpdateTeamRequest> for TeamChanges {
    fn from(req: UpdateTeamRequest) -> Self {
        Self {
            title: req.title,
            archived: req.archived,
        }
    }
}
