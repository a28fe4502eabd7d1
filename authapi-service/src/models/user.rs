//! User model - login identity and global capability flags.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// User entity.
///
/// `password_hash` is an argon2 PHC string and never leaves the service.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    /// Global admin: authorized for every action regardless of team permissions.
    pub is_admin: bool,
    pub created_utc: DateTime<Utc>,
}

/// Fields required to insert a user; the store assigns `id` and `created_utc`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_admin: bool,
}

impl NewUser {
    /// Active, non-admin user.
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
            is_active: true,
            is_admin: false,
        }
    }

    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Partial update of the user's flags.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
}
