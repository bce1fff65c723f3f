//! Membership and role transitions.
//!
//! The invariant checks (owner protection, last-admin retention) run on the
//! same connection immediately before the single-row write, so callers that
//! wrap these functions in a transaction get check+write atomicity. No
//! operation here ever touches more than one workspace's rows.

use crate::api::models::members::WorkspaceRole;
use crate::db::errors::DbError;
use crate::db::handlers::{Memberships, Repository as _};
use crate::db::handlers::memberships::MembershipUpdateDBRequest;
use crate::db::models::memberships::{MembershipCreateDBRequest, MembershipDBResponse};
use crate::errors::{Error, Result};
use crate::types::{abbrev_uuid, UserId, WorkspaceId};
use sqlx::PgConnection;
use tracing::{info, instrument};

/// Add a user to a workspace.
///
/// Fails with a conflict if the membership already exists; idempotent callers
/// check first. New memberships default to `member` unless an admin elevates
/// them explicitly.
#[instrument(
    skip(conn),
    fields(workspace_id = %abbrev_uuid(&workspace_id), user_id = %abbrev_uuid(&user_id)),
    err
)]
pub async fn add_member(
    conn: &mut PgConnection,
    workspace_id: WorkspaceId,
    user_id: UserId,
    role: Option<WorkspaceRole>,
) -> Result<MembershipDBResponse> {
    let mut memberships = Memberships::new(conn);
    match memberships
        .create(&MembershipCreateDBRequest {
            workspace_id,
            user_id,
            role: role.unwrap_or(WorkspaceRole::Member),
            is_owner: false,
        })
        .await
    {
        Ok(membership) => {
            info!("Added member");
            Ok(membership)
        }
        Err(DbError::UniqueViolation { .. }) => Err(Error::Conflict {
            message: "This user is already a member of the workspace".to_string(),
        }),
        Err(e) => Err(Error::Database(e)),
    }
}

/// Change a member's role.
///
/// The owner's membership is protected: [`Error::OwnerProtected`] regardless
/// of who asks. Demoting the final admin would break the at-least-one-admin
/// invariant and fails with [`Error::LastAdmin`] (with the owner invariant in
/// place this only arises in repaired or hand-edited data). The new role is
/// effective for subsequent requests; contexts already resolved in-flight keep
/// the rank they were resolved with.
#[instrument(
    skip(conn),
    fields(workspace_id = %abbrev_uuid(&workspace_id), user_id = %abbrev_uuid(&user_id), new_role = %new_role),
    err
)]
pub async fn update_role(
    conn: &mut PgConnection,
    workspace_id: WorkspaceId,
    user_id: UserId,
    new_role: WorkspaceRole,
) -> Result<MembershipDBResponse> {
    let mut memberships = Memberships::new(&mut *conn);
    let membership = memberships
        .get_by_id((workspace_id, user_id))
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Membership".to_string(),
            id: user_id.to_string(),
        })?;

    if membership.is_owner {
        return Err(Error::OwnerProtected);
    }

    if membership.role == WorkspaceRole::Admin && new_role < WorkspaceRole::Admin {
        let admins = memberships.count_admins(workspace_id).await?;
        if admins <= 1 {
            return Err(Error::LastAdmin);
        }
    }

    let updated = memberships
        .update((workspace_id, user_id), &MembershipUpdateDBRequest { role: new_role })
        .await?;
    info!("Updated member role");
    Ok(updated)
}

/// Remove a member from a workspace.
///
/// The owner cannot be removed ([`Error::OwnerProtected`]), and neither can
/// the last remaining admin ([`Error::LastAdmin`]).
#[instrument(
    skip(conn),
    fields(workspace_id = %abbrev_uuid(&workspace_id), user_id = %abbrev_uuid(&user_id)),
    err
)]
pub async fn remove_member(conn: &mut PgConnection, workspace_id: WorkspaceId, user_id: UserId) -> Result<()> {
    let mut memberships = Memberships::new(conn);
    let membership = memberships
        .get_by_id((workspace_id, user_id))
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Membership".to_string(),
            id: user_id.to_string(),
        })?;

    if membership.is_owner {
        return Err(Error::OwnerProtected);
    }

    if membership.role == WorkspaceRole::Admin {
        let admins = memberships.count_admins(workspace_id).await?;
        if admins <= 1 {
            return Err(Error::LastAdmin);
        }
    }

    memberships.delete((workspace_id, user_id)).await?;
    info!("Removed member");
    Ok(())
}
