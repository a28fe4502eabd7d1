//! PostgreSQL [`Store`].
//!
//! Runtime-checked `query_as` with `FromRow` models; the schema lives in
//! `migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use sqlx::postgres::PgPool;

use super::store::Store;
use super::visibility::ArchivedFilter;
use crate::models::{
    NewPermission, NewUser, Organization, OrganizationChanges, Permission, Team, TeamChanges,
    Token, User, UserChanges,
};

fn db_error(e: sqlx::Error) -> AppError {
    AppError::DatabaseError(anyhow::anyhow!(e))
}

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Flat row for the membership join; split back into `(Team, Organization)`.
#[derive(sqlx::FromRow)]
struct MembershipRow {
    team_id: i64,
    organization_id: i64,
    team_title: String,
    team_archived: bool,
    team_created_utc: DateTime<Utc>,
    org_title: String,
    org_archived: bool,
    org_created_utc: DateTime<Utc>,
}

impl From<MembershipRow> for (Team, Organization) {
    fn from(row: MembershipRow) -> Self {
        (
            Team {
                id: row.team_id,
                organization_id: row.organization_id,
                title: row.team_title,
                archived: row.team_archived,
                created_utc: row.team_created_utc,
            },
            Organization {
                id: row.organization_id,
                title: row.org_title,
                archived: row.org_archived,
                created_utc: row.org_created_utc,
            },
        )
    }
}

#[async_trait]
impl Store for Database {
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }

    // ==================== User Operations ====================

    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, is_active, is_admin)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            other => db_error(other),
        })
    }

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn update_user(
        &self,
        user_id: i64,
        changes: UserChanges,
    ) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_active = COALESCE($2, is_active),
                is_admin = COALESCE($3, is_admin)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(changes.is_active)
        .bind(changes.is_admin)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }

    // ==================== Token Operations ====================

    async fn replace_user_token(&self, user_id: i64, key_hash: &str) -> Result<Token, AppError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // Row lock serializes concurrent logins for the same user.
        let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error)?;
        if locked.is_none() {
            return Err(AppError::not_found("User"));
        }

        sqlx::query("DELETE FROM tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        let token = sqlx::query_as::<_, Token>(
            "INSERT INTO tokens (user_id, key_hash) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(key_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(token)
    }

    async fn find_token_by_hash(&self, key_hash: &str) -> Result<Option<Token>, AppError> {
        sqlx::query_as::<_, Token>("SELECT * FROM tokens WHERE key_hash = $1")
            .bind(key_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn tokens_for_user(&self, user_id: i64) -> Result<Vec<Token>, AppError> {
        sqlx::query_as::<_, Token>("SELECT * FROM tokens WHERE user_id = $1 ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }

    // ==================== Organization Operations ====================

    async fn insert_organization(&self, title: &str) -> Result<Organization, AppError> {
        sqlx::query_as::<_, Organization>(
            "INSERT INTO organizations (title) VALUES ($1) RETURNING *",
        )
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn find_organization(&self, org_id: i64) -> Result<Option<Organization>, AppError> {
        sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
            .bind(org_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn list_organizations(
        &self,
        filter: ArchivedFilter,
    ) -> Result<Vec<Organization>, AppError> {
        sqlx::query_as::<_, Organization>(
            "SELECT * FROM organizations WHERE ($1::BOOLEAN IS NULL OR archived = $1) ORDER BY id",
        )
        .bind(filter.archived())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn update_organization(
        &self,
        org_id: i64,
        changes: OrganizationChanges,
    ) -> Result<Option<Organization>, AppError> {
        sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET title = COALESCE($2, title),
                archived = COALESCE($3, archived)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(org_id)
        .bind(changes.title)
        .bind(changes.archived)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn add_organization_user(&self, org_id: i64, user_id: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO organization_users (organization_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(org_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn remove_organization_user(&self, org_id: i64, user_id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM organization_users WHERE organization_id = $1 AND user_id = $2")
            .bind(org_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn organization_users(&self, org_id: i64) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN organization_users ou ON ou.user_id = u.id
            WHERE ou.organization_id = $1
            ORDER BY u.id
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    // ==================== Team Operations ====================

    async fn insert_team(&self, org_id: i64, title: &str) -> Result<Team, AppError> {
        sqlx::query_as::<_, Team>(
            "INSERT INTO teams (organization_id, title) VALUES ($1, $2) RETURNING *",
        )
        .bind(org_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                AppError::not_found("Organization")
            }
            other => db_error(other),
        })
    }

    async fn find_team(&self, team_id: i64) -> Result<Option<Team>, AppError> {
        sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = $1")
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn teams_for_organization(&self, org_id: i64) -> Result<Vec<Team>, AppError> {
        sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE organization_id = $1 ORDER BY id")
            .bind(org_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn update_team(
        &self,
        team_id: i64,
        changes: TeamChanges,
    ) -> Result<Option<Team>, AppError> {
        sqlx::query_as::<_, Team>(
            r#"
            UPDATE teams
            SET title = COALESCE($2, title),
                archived = COALESCE($3, archived)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(team_id)
        .bind(changes.title)
        .bind(changes.archived)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn add_team_user(&self, team_id: i64, user_id: i64) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO team_users (team_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(team_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn remove_team_user(&self, team_id: i64, user_id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM team_users WHERE team_id = $1 AND user_id = $2")
            .bind(team_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn team_users(&self, team_id: i64) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN team_users tu ON tu.user_id = u.id
            WHERE tu.team_id = $1
            ORDER BY u.id
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn team_memberships_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<(Team, Organization)>, AppError> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT t.id AS team_id,
                   t.organization_id,
                   t.title AS team_title,
                   t.archived AS team_archived,
                   t.created_utc AS team_created_utc,
                   o.title AS org_title,
                   o.archived AS org_archived,
                   o.created_utc AS org_created_utc
            FROM team_users tu
            JOIN teams t ON t.id = tu.team_id
            JOIN organizations o ON o.id = t.organization_id
            WHERE tu.user_id = $1
            ORDER BY t.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    // ==================== Permission Operations ====================

    async fn insert_permission(
        &self,
        team_id: i64,
        permission: NewPermission,
    ) -> Result<Permission, AppError> {
        sqlx::query_as::<_, Permission>(
            r#"
            INSERT INTO permissions (team_id, permission_type, namespace, object_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(team_id)
        .bind(&permission.permission_type)
        .bind(&permission.namespace)
        .bind(&permission.object_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                AppError::not_found("Team")
            }
            other => db_error(other),
        })
    }

    async fn find_permission(&self, permission_id: i64) -> Result<Option<Permission>, AppError> {
        sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE id = $1")
            .bind(permission_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn permissions_for_team(&self, team_id: i64) -> Result<Vec<Permission>, AppError> {
        sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE team_id = $1 ORDER BY id")
            .bind(team_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn permissions_for_teams(&self, team_ids: &[i64]) -> Result<Vec<Permission>, AppError> {
        sqlx::query_as::<_, Permission>(
            "SELECT * FROM permissions WHERE team_id = ANY($1) ORDER BY id",
        )
        .bind(team_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn delete_permission(&self, permission_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(permission_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }
}
