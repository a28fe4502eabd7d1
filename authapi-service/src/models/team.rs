use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A group of users inside one organization, holding permissions.
///
/// `organization_id` is fixed at creation.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Team {
    pub id: i64,
    pub organization_id: i64,
    pub title: String,
    pub archived: bool,
    pub created_utc: DateTime<Utc>,
}

/// Partial update; the owning organization is not updatable.
#[derive(Debug, Clone, Default)]
pub struct TeamChanges {
    pub title: Option<String>,
    pub archived: Option<bool>,
}
