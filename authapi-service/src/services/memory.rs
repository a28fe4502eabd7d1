//! In-process [`Store`] used by the `memory` backend and the test suites.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;

use super::store::Store;
use super::visibility::ArchivedFilter;
use crate::models::{
    NewPermission, NewUser, Organization, OrganizationChanges, Permission, Team, TeamChanges,
    Token, User, UserChanges,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    organizations: BTreeMap<i64, Organization>,
    teams: BTreeMap<i64, Team>,
    permissions: BTreeMap<i64, Permission>,
    tokens: BTreeMap<i64, Token>,
    /// (org_id, user_id)
    organization_users: BTreeSet<(i64, i64)>,
    /// (team_id, user_id)
    team_users: BTreeSet<(i64, i64)>,
    sequences: Sequences,
}

#[derive(Default)]
struct Sequences {
    users: i64,
    organizations: i64,
    teams: i64,
    permissions: i64,
    tokens: i64,
}

fn next_id(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

impl Tables {
    fn users_in(&self, pairs: &BTreeSet<(i64, i64)>, owner: i64) -> Vec<User> {
        pairs
            .range((owner, i64::MIN)..=(owner, i64::MAX))
            .filter_map(|(_, user_id)| self.users.get(user_id).cloned())
            .collect()
    }
}

/// All tables behind one mutex, so every operation is atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("store lock poisoned: {}", e)))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.lock().map(|_| ())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Email already registered"
            )));
        }
        let id = next_id(&mut tables.sequences.users);
        let user = User {
            id,
            email: user.email,
            password_hash: user.password_hash,
            is_active: user.is_active,
            is_admin: user.is_admin,
            created_utc: Utc::now(),
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<User>, AppError> {
        Ok(self.lock()?.users.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_user(
        &self,
        user_id: i64,
        changes: UserChanges,
    ) -> Result<Option<User>, AppError> {
        let mut tables = self.lock()?;
        Ok(tables.users.get_mut(&user_id).map(|user| {
            if let Some(is_active) = changes.is_active {
                user.is_active = is_active;
            }
            if let Some(is_admin) = changes.is_admin {
                user.is_admin = is_admin;
            }
            user.clone()
        }))
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.lock()?.users.values().cloned().collect())
    }

    async fn replace_user_token(&self, user_id: i64, key_hash: &str) -> Result<Token, AppError> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(&user_id) {
            return Err(AppError::not_found("User"));
        }
        tables.tokens.retain(|_, t| t.user_id != user_id);
        let id = next_id(&mut tables.sequences.tokens);
        let token = Token {
            id,
            user_id,
            key_hash: key_hash.to_string(),
            created_utc: Utc::now(),
        };
        tables.tokens.insert(id, token.clone());
        Ok(token)
    }

    async fn find_token_by_hash(&self, key_hash: &str) -> Result<Option<Token>, AppError> {
        Ok(self
            .lock()?
            .tokens
            .values()
            .find(|t| t.key_hash == key_hash)
            .cloned())
    }

    async fn tokens_for_user(&self, user_id: i64) -> Result<Vec<Token>, AppError> {
        Ok(self
            .lock()?
            .tokens
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_organization(&self, title: &str) -> Result<Organization, AppError> {
        let mut tables = self.lock()?;
        let id = next_id(&mut tables.sequences.organizations);
        let org = Organization {
            id,
            title: title.to_string(),
            archived: false,
            created_utc: Utc::now(),
        };
        tables.organizations.insert(id, org.clone());
        Ok(org)
    }

    async fn find_organization(&self, org_id: i64) -> Result<Option<Organization>, AppError> {
        Ok(self.lock()?.organizations.get(&org_id).cloned())
    }

    async fn list_organizations(
        &self,
        filter: ArchivedFilter,
    ) -> Result<Vec<Organization>, AppError> {
        Ok(self
            .lock()?
            .organizations
            .values()
            .filter(|org| filter.matches(org))
            .cloned()
            .collect())
    }

    async fn update_organization(
        &self,
        org_id: i64,
        changes: OrganizationChanges,
    ) -> Result<Option<Organization>, AppError> {
        let mut tables = self.lock()?;
        Ok(tables.organizations.get_mut(&org_id).map(|org| {
            if let Some(title) = changes.title {
                org.title = title;
            }
            if let Some(archived) = changes.archived {
                org.archived = archived;
            }
            org.clone()
        }))
    }

    async fn add_organization_user(&self, org_id: i64, user_id: i64) -> Result<(), AppError> {
        self.lock()?.organization_users.insert((org_id, user_id));
        Ok(())
    }

    async fn remove_organization_user(&self, org_id: i64, user_id: i64) -> Result<(), AppError> {
        self.lock()?.organization_users.remove(&(org_id, user_id));
        Ok(())
    }

    async fn organization_users(&self, org_id: i64) -> Result<Vec<User>, AppError> {
        let tables = self.lock()?;
        Ok(tables.users_in(&tables.organization_users, org_id))
    }

    async fn insert_team(&self, org_id: i64, title: &str) -> Result<Team, AppError> {
        let mut tables = self.lock()?;
        if !tables.organizations.contains_key(&org_id) {
            return Err(AppError::not_found("Organization"));
        }
        let id = next_id(&mut tables.sequences.teams);
        let team = Team {
            id,
            organization_id: org_id,
            title: title.to_string(),
            archived: false,
            created_utc: Utc::now(),
        };
        tables.teams.insert(id, team.clone());
        Ok(team)
    }

    async fn find_team(&self, team_id: i64) -> Result<Option<Team>, AppError> {
        Ok(self.lock()?.teams.get(&team_id).cloned())
    }

    async fn teams_for_organization(&self, org_id: i64) -> Result<Vec<Team>, AppError> {
        Ok(self
            .lock()?
            .teams
            .values()
            .filter(|t| t.organization_id == org_id)
            .cloned()
            .collect())
    }

    async fn update_team(
        &self,
        team_id: i64,
        changes: TeamChanges,
    ) -> Result<Option<Team>, AppError> {
        let mut tables = self.lock()?;
        Ok(tables.teams.get_mut(&team_id).map(|team| {
            if let Some(title) = changes.title {
                team.title = title;
            }
            if let Some(archived) = changes.archived {
                team.archived = archived;
            }
            team.clone()
        }))
    }

    async fn add_team_user(&self, team_id: i64, user_id: i64) -> Result<(), AppError> {
        self.lock()?.team_users.insert((team_id, user_id));
        Ok(())
    }

    async fn remove_team_user(&self, team_id: i64, user_id: i64) -> Result<(), AppError> {
        self.lock()?.team_users.remove(&(team_id, user_id));
        Ok(())
    }

    async fn team_users(&self, team_id: i64) -> Result<Vec<User>, AppError> {
        let tables = self.lock()?;
        Ok(tables.users_in(&tables.team_users, team_id))
    }

    async fn team_memberships_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<(Team, Organization)>, AppError> {
        let tables = self.lock()?;
        Ok(tables
            .team_users
            .iter()
            .filter(|(_, member)| *member == user_id)
            .filter_map(|(team_id, _)| {
                let team = tables.teams.get(team_id)?;
                let org = tables.organizations.get(&team.organization_id)?;
                Some((team.clone(), org.clone()))
            })
            .collect())
    }

    async fn insert_permission(
        &self,
        team_id: i64,
        permission: NewPermission,
    ) -> Result<Permission, AppError> {
        let mut tables = self.lock()?;
        if !tables.teams.contains_key(&team_id) {
            return Err(AppError::not_found("Team"));
        }
        let id = next_id(&mut tables.sequences.permissions);
        let permission = Permission {
            id,
            team_id,
            permission_type: permission.permission_type,
            namespace: permission.namespace,
            object_id: permission.object_id,
            created_utc: Utc::now(),
        };
        tables.permissions.insert(id, permission.clone());
        Ok(permission)
    }

    async fn find_permission(&self, permission_id: i64) -> Result<Option<Permission>, AppError> {
        Ok(self.lock()?.permissions.get(&permission_id).cloned())
    }

    async fn permissions_for_team(&self, team_id: i64) -> Result<Vec<Permission>, AppError> {
        self.permissions_for_teams(&[team_id]).await
    }

    async fn permissions_for_teams(&self, team_ids: &[i64]) -> Result<Vec<Permission>, AppError> {
        Ok(self
            .lock()?
            .permissions
            .values()
            .filter(|p| team_ids.contains(&p.team_id))
            .cloned()
            .collect())
    }

    async fn delete_permission(&self, permission_id: i64) -> Result<bool, AppError> {
        Ok(self.lock()?.permissions.remove(&permission_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        store.insert_user(NewUser::new("a@example.com", "x")).await.unwrap();
        let err = store
            .insert_user(NewUser::new("a@example.com", "y"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn replacing_a_token_leaves_exactly_one() {
        let store = MemoryStore::new();
        let user = store.insert_user(NewUser::new("a@example.com", "x")).await.unwrap();

        store.replace_user_token(user.id, "first").await.unwrap();
        let second = store.replace_user_token(user.id, "second").await.unwrap();

        let tokens = store.tokens_for_user(user.id).await.unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].id, second.id);
        assert!(store.find_token_by_hash("first").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn membership_is_idempotent_and_scoped_to_owner() {
        let store = MemoryStore::new();
        let user = store.insert_user(NewUser::new("a@example.com", "x")).await.unwrap();
        let acme = store.insert_organization("Acme").await.unwrap();
        let other = store.insert_organization("Other").await.unwrap();

        store.add_organization_user(acme.id, user.id).await.unwrap();
        store.add_organization_user(acme.id, user.id).await.unwrap();

        assert_eq!(store.organization_users(acme.id).await.unwrap().len(), 1);
        assert!(store.organization_users(other.id).await.unwrap().is_empty());

        store.remove_organization_user(acme.id, user.id).await.unwrap();
        store.remove_organization_user(acme.id, user.id).await.unwrap();
        assert!(store.organization_users(acme.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn memberships_include_archived_teams() {
        let store = MemoryStore::new();
        let user = store.insert_user(NewUser::new("a@example.com", "x")).await.unwrap();
        let org = store.insert_organization("Acme").await.unwrap();
        let team = store.insert_team(org.id, "Ops").await.unwrap();
        store.add_team_user(team.id, user.id).await.unwrap();
        store
            .update_team(
                team.id,
                TeamChanges {
                    archived: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let memberships = store.team_memberships_for_user(user.id).await.unwrap();
        assert_eq!(memberships.len(), 1);
        assert!(memberships[0].0.archived);
        assert_eq!(memberships[0].1.id, org.id);
    }

    #[tokio::test]
    async fn deleting_a_missing_permission_reports_false() {
        let store = MemoryStore::new();
        assert!(!store.delete_permission(42).await.unwrap());
    }
}
