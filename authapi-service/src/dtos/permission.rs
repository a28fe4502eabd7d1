use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{NewPermission, Permission};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PermissionResponse {
    pub id: i64,
    #[serde(rename = "type")]
    #[schema(example = "org:write")]
    pub permission_type: String,
    #[schema(example = "1")]
    pub namespace: String,
    #[schema(example = "")]
    pub object_id: String,
}

impl From<Permission> for PermissionResponse {
    fn from(p: Permission) -> Self {
        Self {
            id: p.id,
            permission_type: p.permission_type,
            namespace: p.namespace,
            object_id: p.object_id,
        }
    }
}

/// `object_id` may be empty; the other two may not.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePermissionRequest {
    #[serde(rename = "type", default, deserialize_with = "crate::utils::trimmed")]
    #[validate(
        required(message = "This field is required."),
        length(min = 1, message = "This field may not be blank.")
    )]
    #[schema(example = "org:write")]
    pub permission_type: Option<String>,

    #[serde(default, deserialize_with = "crate::utils::trimmed")]
    #[validate(
        required(message = "This field is required."),
        length(min = 1, message = "This field may not be blank.")
    )]
    #[schema(example = "1")]
    pub namespace: Option<String>,

    #[validate(required(message = "This field is required."))]
    #[schema(example = "")]
    pub object_id: Option<String>,
}

impl CreatePermissionRequest {
    /// Call after validation.
    pub fn into_new_permission(self) -> NewPermission {
        NewPermission::new(
            self.permission_type.unwrap_or_default(),
            self.namespace.unwrap_or_default(),
            self.object_id.unwrap_or_default(),
        )
    }
}
