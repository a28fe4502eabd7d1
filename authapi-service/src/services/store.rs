//! Persistence seam for users, organizations, teams, permissions and tokens.
//!
//! Handlers and services only ever hold an `Arc<dyn Store>`. [`Database`]
//! backs it with PostgreSQL, [`MemoryStore`] keeps everything in-process for
//! development and tests.
//!
//! [`Database`]: super::Database
//! [`MemoryStore`]: super::MemoryStore

use async_trait::async_trait;
use service_core::error::AppError;

use super::visibility::ArchivedFilter;
use crate::models::{
    NewPermission, NewUser, Organization, OrganizationChanges, Permission, Team, TeamChanges,
    Token, User, UserChanges,
};

#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    // ==================== Users ====================

    /// Fails with `AppError::Conflict` when the email is already registered.
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn update_user(
        &self,
        user_id: i64,
        changes: UserChanges,
    ) -> Result<Option<User>, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    // ==================== Tokens ====================

    /// Deletes any token the user holds and stores the new hash, atomically.
    async fn replace_user_token(&self, user_id: i64, key_hash: &str) -> Result<Token, AppError>;
    async fn find_token_by_hash(&self, key_hash: &str) -> Result<Option<Token>, AppError>;
    async fn tokens_for_user(&self, user_id: i64) -> Result<Vec<Token>, AppError>;

    // ==================== Organizations ====================

    async fn insert_organization(&self, title: &str) -> Result<Organization, AppError>;
    async fn find_organization(&self, org_id: i64) -> Result<Option<Organization>, AppError>;
    async fn list_organizations(
        &self,
        filter: ArchivedFilter,
    ) -> Result<Vec<Organization>, AppError>;
    async fn update_organization(
        &self,
        org_id: i64,
        changes: OrganizationChanges,
    ) -> Result<Option<Organization>, AppError>;
    /// Idempotent.
    async fn add_organization_user(&self, org_id: i64, user_id: i64) -> Result<(), AppError>;
    /// No-op when the user is not a member.
    async fn remove_organization_user(&self, org_id: i64, user_id: i64) -> Result<(), AppError>;
    async fn organization_users(&self, org_id: i64) -> Result<Vec<User>, AppError>;

    // ==================== Teams ====================

    async fn insert_team(&self, org_id: i64, title: &str) -> Result<Team, AppError>;
    async fn find_team(&self, team_id: i64) -> Result<Option<Team>, AppError>;
    async fn teams_for_organization(&self, org_id: i64) -> Result<Vec<Team>, AppError>;
    async fn update_team(
        &self,
        team_id: i64,
        changes: TeamChanges,
    ) -> Result<Option<Team>, AppError>;
    /// Idempotent.
    async fn add_team_user(&self, team_id: i64, user_id: i64) -> Result<(), AppError>;
    /// No-op when the user is not a member.
    async fn remove_team_user(&self, team_id: i64, user_id: i64) -> Result<(), AppError>;
    async fn team_users(&self, team_id: i64) -> Result<Vec<User>, AppError>;
    /// Every team the user belongs to, paired with its organization.
    /// Archived teams and organizations are included.
    async fn team_memberships_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<(Team, Organization)>, AppError>;

    // ==================== Permissions ====================

    async fn insert_permission(
        &self,
        team_id: i64,
        permission: NewPermission,
    ) -> Result<Permission, AppError>;
    async fn find_permission(&self, permission_id: i64) -> Result<Option<Permission>, AppError>;
    async fn permissions_for_team(&self, team_id: i64) -> Result<Vec<Permission>, AppError>;
    /// Ordered by id.
    async fn permissions_for_teams(&self, team_ids: &[i64]) -> Result<Vec<Permission>, AppError>;
    /// Returns false when nothing was deleted.
    async fn delete_permission(&self, permission_id: i64) -> Result<bool, AppError>;
}
