//! Workspace resolution.
//!
//! Given an optional explicit workspace id (route parameter) and the user's
//! remembered workspace (persisted on their user record), produce exactly one
//! workspace to treat as current, or fail.
//!
//! Resolution never falls back when an explicit id was given: a workspace the
//! user has no membership in resolves to [`Error::WorkspaceNotFound`] whether
//! or not it exists, so probing cannot distinguish "not yours" from "not
//! there".

use crate::db::handlers::{Memberships, Repository as _, Users, Workspaces};
use crate::db::models::memberships::MembershipDBResponse;
use crate::db::models::workspaces::WorkspaceDBResponse;
use crate::errors::{Error, Result};
use crate::types::{abbrev_uuid, UserId, WorkspaceId};
use sqlx::PgConnection;
use tracing::{instrument, trace};

/// A successfully resolved workspace together with the caller's membership
#[derive(Debug, Clone)]
pub struct ResolvedWorkspace {
    pub workspace: WorkspaceDBResponse,
    pub membership: MembershipDBResponse,
}

/// Load a workspace for a user, requiring a membership.
///
/// Returns `None` when the membership or the workspace is absent - callers
/// must not distinguish the two.
async fn load_for_member(conn: &mut PgConnection, user_id: UserId, workspace_id: WorkspaceId) -> Result<Option<ResolvedWorkspace>> {
    let mut memberships = Memberships::new(&mut *conn);
    let membership = match memberships.get_by_id((workspace_id, user_id)).await? {
        Some(membership) => membership,
        None => return Ok(None),
    };

    let mut workspaces = Workspaces::new(&mut *conn);
    let workspace = match workspaces.get_by_id(workspace_id).await? {
        Some(workspace) => workspace,
        None => return Ok(None),
    };

    Ok(Some(ResolvedWorkspace { workspace, membership }))
}

/// Resolve the current workspace for a user.
///
/// - With an explicit id: the user must hold a membership for it, otherwise
///   [`Error::WorkspaceNotFound`] - never a silent fallback.
/// - Without one: the remembered workspace is used if the membership still
///   holds; otherwise the user's single workspace if exactly one exists;
///   otherwise [`Error::WorkspaceSelectionRequired`] (several candidates) or
///   [`Error::WorkspaceNotFound`] (no memberships at all - an error state
///   requiring explicit provisioning).
///
/// Resolution is read-only and deterministic; the guard persists the
/// remembered-workspace side effect after a successful resolution.
#[instrument(skip(conn), fields(user_id = %abbrev_uuid(&user_id), explicit = ?explicit.map(|id| abbrev_uuid(&id))), err)]
pub async fn resolve(conn: &mut PgConnection, user_id: UserId, explicit: Option<WorkspaceId>) -> Result<ResolvedWorkspace> {
    if let Some(workspace_id) = explicit {
        return load_for_member(conn, user_id, workspace_id).await?.ok_or(Error::WorkspaceNotFound {
            workspace_id: Some(workspace_id),
        });
    }

    // No explicit id: try the remembered workspace first
    let mut users = Users::new(&mut *conn);
    if let Some(remembered) = users.remembered_workspace(user_id).await? {
        if let Some(resolved) = load_for_member(conn, user_id, remembered).await? {
            trace!("Resolved remembered workspace");
            return Ok(resolved);
        }
        // Membership gone since it was remembered; fall through to the
        // candidate scan rather than failing.
    }

    let mut memberships = Memberships::new(&mut *conn);
    let candidate_ids = memberships.workspace_ids_for_user(user_id).await?;

    match candidate_ids.as_slice() {
        [] => Err(Error::WorkspaceNotFound { workspace_id: None }),
        [only] => load_for_member(conn, user_id, *only)
            .await?
            .ok_or(Error::WorkspaceNotFound { workspace_id: Some(*only) }),
        _ => Err(Error::WorkspaceSelectionRequired),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{add_member, create_test_user, create_test_workspace};
    use crate::api::models::members::WorkspaceRole;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_explicit_resolution_requires_membership(pool: PgPool) {
        let owner = create_test_user(&pool, "owner@example.com").await;
        let outsider = create_test_user(&pool, "outsider@example.com").await;
        let workspace = create_test_workspace(&pool, &owner, "Acme").await;

        let mut conn = pool.acquire().await.unwrap();

        // Owner resolves fine
        let resolved = resolve(&mut conn, owner.id, Some(workspace.id)).await.unwrap();
        assert_eq!(resolved.workspace.id, workspace.id);
        assert!(resolved.membership.is_owner);

        // A user without membership gets not-found, even though the workspace exists
        let err = resolve(&mut conn, outsider.id, Some(workspace.id)).await.unwrap_err();
        assert!(matches!(err, Error::WorkspaceNotFound { .. }));
    }

    #[sqlx::test]
    async fn test_no_existence_leak_for_missing_workspace(pool: PgPool) {
        let user = create_test_user(&pool, "user@example.com").await;
        let owner = create_test_user(&pool, "owner@example.com").await;
        let existing = create_test_workspace(&pool, &owner, "Someone Elses").await;

        let mut conn = pool.acquire().await.unwrap();

        // Same error shape for "exists but not yours" and "does not exist"
        let err_foreign = resolve(&mut conn, user.id, Some(existing.id)).await.unwrap_err();
        let err_missing = resolve(&mut conn, user.id, Some(uuid::Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err_foreign, Error::WorkspaceNotFound { .. }));
        assert!(matches!(err_missing, Error::WorkspaceNotFound { .. }));
        assert_eq!(err_foreign.user_message(), err_missing.user_message());
    }

    #[sqlx::test]
    async fn test_implicit_resolution_single_workspace(pool: PgPool) {
        let user = create_test_user(&pool, "solo@example.com").await;
        let workspace = create_test_workspace(&pool, &user, "Solo").await;

        let mut conn = pool.acquire().await.unwrap();
        let resolved = resolve(&mut conn, user.id, None).await.unwrap();
        assert_eq!(resolved.workspace.id, workspace.id);
    }

    #[sqlx::test]
    async fn test_implicit_resolution_prefers_remembered(pool: PgPool) {
        let user = create_test_user(&pool, "multi@example.com").await;
        let first = create_test_workspace(&pool, &user, "First").await;
        let _second = create_test_workspace(&pool, &user, "Second").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);
        users.remember_workspace(user.id, first.id).await.unwrap();

        let resolved = resolve(&mut conn, user.id, None).await.unwrap();
        assert_eq!(resolved.workspace.id, first.id);
    }

    #[sqlx::test]
    async fn test_implicit_resolution_ambiguous_without_remembered(pool: PgPool) {
        let user = create_test_user(&pool, "multi@example.com").await;
        let _first = create_test_workspace(&pool, &user, "First").await;
        let _second = create_test_workspace(&pool, &user, "Second").await;

        let mut conn = pool.acquire().await.unwrap();
        let err = resolve(&mut conn, user.id, None).await.unwrap_err();
        assert!(matches!(err, Error::WorkspaceSelectionRequired));
    }

    #[sqlx::test]
    async fn test_stale_remembered_workspace_falls_through(pool: PgPool) {
        let user = create_test_user(&pool, "stale@example.com").await;
        let owner = create_test_user(&pool, "owner@example.com").await;
        let mine = create_test_workspace(&pool, &user, "Mine").await;
        let theirs = create_test_workspace(&pool, &owner, "Theirs").await;

        // User was once a member of "theirs" and remembered it
        add_member(&pool, theirs.id, user.id, WorkspaceRole::Member).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);
        users.remember_workspace(user.id, theirs.id).await.unwrap();

        // Membership revoked: resolution falls back to the remaining workspace
        let mut memberships = Memberships::new(&mut conn);
        memberships.delete((theirs.id, user.id)).await.unwrap();

        let resolved = resolve(&mut conn, user.id, None).await.unwrap();
        assert_eq!(resolved.workspace.id, mine.id);
    }

    #[sqlx::test]
    async fn test_zero_memberships_is_an_error(pool: PgPool) {
        let user = create_test_user(&pool, "lonely@example.com").await;

        let mut conn = pool.acquire().await.unwrap();
        let err = resolve(&mut conn, user.id, None).await.unwrap_err();
        assert!(matches!(err, Error::WorkspaceNotFound { workspace_id: None }));
    }

    #[sqlx::test]
    async fn test_resolution_is_idempotent(pool: PgPool) {
        let user = create_test_user(&pool, "repeat@example.com").await;
        let workspace = create_test_workspace(&pool, &user, "Repeat").await;

        let mut conn = pool.acquire().await.unwrap();
        let first = resolve(&mut conn, user.id, Some(workspace.id)).await.unwrap();
        let second = resolve(&mut conn, user.id, Some(workspace.id)).await.unwrap();
        assert_eq!(first.workspace.id, second.workspace.id);
        assert_eq!(first.membership.role, second.membership.role);
    }
}
