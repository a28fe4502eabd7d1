use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::Links;
use crate::models::{User, UserChanges};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub url: String,
    pub id: i64,
    #[schema(example = "user@example.com")]
    pub email: String,
    pub is_active: bool,
    pub is_admin: bool,
}

impl UserResponse {
    pub fn build(links: &Links, user: User) -> Self {
        Self {
            url: links.user(user.id).url,
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            is_admin: user.is_admin,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(
        required(message = "This field is required."),
        email(message = "Enter a valid email address.")
    )]
    #[schema(example = "user@example.com")]
    pub email: Option<String>,

    #[validate(
        required(message = "This field is required."),
        length(min = 1, message = "This field may not be blank.")
    )]
    pub password: Option<String>,

    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    /// `false` deactivates the account and invalidates its token.
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            is_active: req.is_active,
            is_admin: req.is_admin,
        }
    }
}
