use service_core::error::AppError;

use super::store::Store;
use super::visibility::{team_visible, user_visible};
use crate::models::{Permission, User};

/// Union of the permissions of every live team the user belongs to.
///
/// Inactive users resolve to nothing. A team counts only while neither it nor
/// its organization is archived. Ordered by permission id, no duplicates.
pub async fn resolve_effective_permissions(
    store: &dyn Store,
    user: &User,
) -> Result<Vec<Permission>, AppError> {
    if !user_visible(user) {
        return Ok(Vec::new());
    }

    let team_ids: Vec<i64> = store
        .team_memberships_for_user(user.id)
        .await?
        .into_iter()
        .filter(|(team, org)| team_visible(team, org))
        .map(|(team, _)| team.id)
        .collect();

    if team_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut permissions = store.permissions_for_teams(&team_ids).await?;
    permissions.sort_by_key(|p| p.id);
    permissions.dedup_by_key(|p| p.id);
    Ok(permissions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewPermission, NewUser, OrganizationChanges, TeamChanges, UserChanges};
    use crate::services::MemoryStore;

    struct Fixture {
        store: MemoryStore,
        user: User,
        org_id: i64,
        team_id: i64,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let user = store
            .insert_user(NewUser::new("member@example.com", "x"))
            .await
            .unwrap();
        let org = store.insert_organization("Acme").await.unwrap();
        let team = store.insert_team(org.id, "Ops").await.unwrap();
        store.add_team_user(team.id, user.id).await.unwrap();
        store
            .insert_permission(team.id, NewPermission::new("read", "acme", "1"))
            .await
            .unwrap();
        Fixture {
            store,
            user,
            org_id: org.id,
            team_id: team.id,
        }
    }

    #[tokio::test]
    async fn member_gets_team_permissions() {
        let f = fixture().await;
        let perms = resolve_effective_permissions(&f.store, &f.user).await.unwrap();
        assert_eq!(perms.len(), 1);
        assert_eq!(perms[0].permission_type, "read");
        assert_eq!(perms[0].namespace, "acme");
        assert_eq!(perms[0].object_id, "1");
    }

    #[tokio::test]
    async fn union_across_teams_without_duplicates() {
        let f = fixture().await;
        let second = f.store.insert_team(f.org_id, "Dev").await.unwrap();
        f.store.add_team_user(second.id, f.user.id).await.unwrap();
        f.store
            .insert_permission(second.id, NewPermission::new("write", "acme", "2"))
            .await
            .unwrap();

        let perms = resolve_effective_permissions(&f.store, &f.user).await.unwrap();
        let types: Vec<_> = perms.iter().map(|p| p.permission_type.as_str()).collect();
        assert_eq!(types, vec!["read", "write"]);
    }

    #[tokio::test]
    async fn archived_team_contributes_nothing() {
        let f = fixture().await;
        f.store
            .update_team(
                f.team_id,
                TeamChanges {
                    archived: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(resolve_effective_permissions(&f.store, &f.user)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn archived_organization_contributes_nothing() {
        let f = fixture().await;
        f.store
            .update_organization(
                f.org_id,
                OrganizationChanges {
                    archived: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(resolve_effective_permissions(&f.store, &f.user)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn inactive_user_resolves_to_nothing() {
        let f = fixture().await;
        let user = f
            .store
            .update_user(
                f.user.id,
                UserChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert!(resolve_effective_permissions(&f.store, &user)
            .await
            .unwrap()
            .is_empty());
    }
}
