use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Top-level grouping that owns teams and has its own member list.
///
/// Deleting an organization only sets `archived`; its teams stay in place
/// but stop contributing permissions.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Organization {
    pub id: i64,
    pub title: String,
    pub archived: bool,
    pub created_utc: DateTime<Utc>,
}

impl Organization {
    /// The value a permission's `namespace` must carry to scope it to this organization.
    pub fn namespace(&self) -> String {
        self.id.to_string()
    }
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct OrganizationChanges {
    pub title: Option<String>,
    pub archived: Option<bool>,
}
