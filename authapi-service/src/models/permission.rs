use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Grants `permission_type` on `object_id` within `namespace`, for every
/// member of the owning team.
///
/// All three fields are free-form and compared by exact string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, FromRow)]
pub struct Permission {
    pub id: i64,
    pub team_id: i64,
    pub permission_type: String,
    pub namespace: String,
    pub object_id: String,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPermission {
    pub permission_type: String,
    pub namespace: String,
    pub object_id: String,
}

impl NewPermission {
    pub fn new(
        permission_type: impl Into<String>,
        namespace: impl Into<String>,
        object_id: impl Into<String>,
    ) -> Self {
        Self {
            permission_type: permission_type.into(),
            namespace: namespace.into(),
            object_id: object_id.into(),
        }
    }
}
