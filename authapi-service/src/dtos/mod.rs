pub mod auth;
pub mod organization;
pub mod permission;
pub mod team;
pub mod user;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Authentication credentials were not provided.")]
    pub error: String,
}

/// Hyperlink plus id, used wherever one resource points at another.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResourceRef {
    #[schema(example = "http://localhost:8080/organizations/1")]
    pub url: String,
    #[schema(example = 1)]
    pub id: i64,
}

/// Builds absolute resource URLs from the configured public base URL.
#[derive(Debug, Clone)]
pub struct Links {
    base: String,
}

impl Links {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn organization(&self, org_id: i64) -> ResourceRef {
        ResourceRef {
            url: format!("{}/organizations/{}", self.base, org_id),
            id: org_id,
        }
    }

    pub fn team(&self, org_id: i64, team_id: i64) -> ResourceRef {
        ResourceRef {
            url: format!("{}/organizations/{}/teams/{}", self.base, org_id, team_id),
            id: team_id,
        }
    }

    pub fn user(&self, user_id: i64) -> ResourceRef {
        ResourceRef {
            url: format!("{}/users/{}", self.base, user_id),
            id: user_id,
        }
    }
}
