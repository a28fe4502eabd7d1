use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::permission::PermissionResponse;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TokenRequest {
    #[validate(required(message = "This field is required."))]
    #[schema(example = "user@example.com")]
    pub email: Option<String>,

    #[validate(required(message = "This field is required."))]
    #[schema(example = "password123")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    #[schema(example = "9944b09199c62bcf9418ad846dd0e4bbdfc6ee4b")]
    pub token: String,
}

/// The caller and everything their live teams grant them.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentUserResponse {
    pub id: i64,
    #[schema(example = "user@example.com")]
    pub email: String,
    pub permissions: Vec<PermissionResponse>,
}
