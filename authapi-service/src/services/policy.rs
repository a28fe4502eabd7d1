//! Three-tier authorization policy.
//!
//! Evaluated top to bottom, first match wins:
//!
//! 1. global admins may do anything;
//! 2. no active user means unauthenticated;
//! 3. reads are open to any authenticated user;
//! 4. organization writes need `org:write` or `org:admin` on that organization;
//! 5. organization admin actions need `org:admin`;
//! 6. everything else is denied.
//!
//! Organization grants are permissions whose `namespace` is the organization
//! id. Inactive users are rejected by token resolution before a handler runs;
//! here an inactive non-admin counts as unauthenticated.

use service_core::error::AppError;

use super::resolver::resolve_effective_permissions;
use super::store::Store;
use crate::models::{Permission, Team, User};

pub const ORG_WRITE: &str = "org:write";
pub const ORG_ADMIN: &str = "org:admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
    Admin,
}

impl Action {
    /// Permission types that satisfy this action on an organization.
    fn granted_by(self) -> &'static [&'static str] {
        match self {
            Action::Read => &[],
            Action::Write => &[ORG_WRITE, ORG_ADMIN],
            Action::Admin => &[ORG_ADMIN],
        }
    }
}

/// What an action targets. Team operations are scoped to the owning
/// organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Organization(i64),
}

impl Scope {
    pub fn for_team(team: &Team) -> Self {
        Scope::Organization(team.organization_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
    Unauthenticated,
}

impl Decision {
    /// 401 for `Unauthenticated`, 403 for `Deny`.
    pub fn into_result(self) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(AppError::Forbidden(anyhow::anyhow!(
                "You do not have permission to perform this action."
            ))),
            Decision::Unauthenticated => Err(AppError::Unauthorized(anyhow::anyhow!(
                "Authentication credentials were not provided."
            ))),
        }
    }
}

/// Whether `permissions` contain an organization-wide grant covering `action`.
pub fn grants(permissions: &[Permission], action: Action, scope: Scope) -> bool {
    let Scope::Organization(org_id) = scope else {
        return false;
    };
    let namespace = org_id.to_string();
    permissions.iter().any(|p| {
        p.namespace == namespace
            && action.granted_by().contains(&p.permission_type.as_str())
    })
}

pub async fn authorize(
    store: &dyn Store,
    user: Option<&User>,
    action: Action,
    scope: Scope,
) -> Result<Decision, AppError> {
    if user.is_some_and(|u| u.is_admin) {
        return Ok(Decision::Allow);
    }

    let user = match user {
        Some(user) if user.is_active => user,
        _ => return Ok(Decision::Unauthenticated),
    };

    if action == Action::Read {
        return Ok(Decision::Allow);
    }

    if matches!(scope, Scope::Global) {
        return Ok(Decision::Deny);
    }

    let permissions = resolve_effective_permissions(store, user).await?;
    if grants(&permissions, action, scope) {
        Ok(Decision::Allow)
    } else {
        tracing::debug!(user_id = user.id, ?action, ?scope, "Authorization denied");
        Ok(Decision::Deny)
    }
}

pub async fn is_authorized(
    store: &dyn Store,
    user: &User,
    action: Action,
    scope: Scope,
) -> Result<bool, AppError> {
    Ok(authorize(store, Some(user), action, scope).await? == Decision::Allow)
}

/// `authorize` folded into the handler error path.
pub async fn require(
    store: &dyn Store,
    user: Option<&User>,
    action: Action,
    scope: Scope,
) -> Result<(), AppError> {
    authorize(store, user, action, scope).await?.into_result()
}
