//! Workspace isolation core: resolution, access guards, scoped queries, and
//! membership transitions.
//!
//! A workspace is the tenant boundary. Every piece of tenant-owned business
//! data carries exactly one `workspace_id` foreign key, and all access to such
//! data in handler code flows through this module:
//!
//! - [`resolver`]: turns "the request's workspace id, or the one this user
//!   used last" into exactly one workspace, or fails.
//! - [`guard`]: the `WorkspaceScope<role::...>` extractor that runs the
//!   resolver, checks the caller's role rank, and publishes the
//!   request-scoped [`WorkspaceContext`].
//! - [`scoped`]: the query helper that narrows reads/writes on
//!   workspace-owned entities to the resolved workspace.
//! - [`members`]: add/remove/role-change operations with owner protection.

pub mod guard;
pub mod members;
pub mod resolver;
pub mod scoped;

use crate::api::models::members::WorkspaceRole;
use crate::api::models::users::CurrentUser;
use crate::db::errors::DbError;
use crate::db::handlers::{Memberships, Repository as _, Users, Workspaces};
use crate::db::models::memberships::MembershipCreateDBRequest;
use crate::db::models::users::UserDBResponse;
use crate::db::models::workspaces::{generate_slug, WorkspaceCreateDBRequest, WorkspaceDBResponse};
use crate::errors::{Error, Result};
use crate::types::{UserId, WorkspaceId};
use sqlx::PgConnection;
use tracing::{info, instrument};

/// The request-scoped workspace context.
///
/// Produced by the access guard once per request after successful resolution
/// and role check; consumed by handlers and the scoped query helper. Never
/// cached across requests.
#[derive(Debug, Clone)]
pub struct WorkspaceContext {
    pub user: CurrentUser,
    pub workspace: WorkspaceDBResponse,
    pub role: WorkspaceRole,
    pub is_owner: bool,
}

impl WorkspaceContext {
    pub fn workspace_id(&self) -> WorkspaceId {
        self.workspace.id
    }

    /// Plan gate: the workspace's plan is the sole input for Pro-only behavior
    pub fn require_pro(&self) -> Result<()> {
        if self.workspace.is_pro() {
            Ok(())
        } else {
            Err(Error::PlanRequired)
        }
    }
}

/// How many times to retry workspace creation on a slug collision before
/// giving up and surfacing the conflict.
const SLUG_RETRIES: usize = 3;

/// Create a workspace and its owner membership in the caller's transaction.
///
/// The creator becomes the owner: an `admin` membership with the protected
/// `is_owner` flag. Slug collisions are resolved by appending a short random
/// suffix.
#[instrument(skip(conn), fields(name = %name), err)]
pub async fn create_workspace(conn: &mut PgConnection, name: &str, owner_id: UserId) -> Result<WorkspaceDBResponse> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::BadRequest {
            message: "Workspace name is required".to_string(),
        });
    }

    let base_slug = {
        let slug = generate_slug(name);
        if slug.is_empty() {
            "workspace".to_string()
        } else {
            slug
        }
    };

    let mut attempt = 0;
    let workspace = loop {
        let slug = if attempt == 0 {
            base_slug.clone()
        } else {
            format!("{base_slug}-{}", &uuid::Uuid::new_v4().simple().to_string()[..6])
        };

        let mut workspaces = Workspaces::new(&mut *conn);
        match workspaces
            .create(&WorkspaceCreateDBRequest {
                name: name.to_string(),
                slug,
                owner_id,
            })
            .await
        {
            Ok(workspace) => break workspace,
            Err(DbError::UniqueViolation { constraint, .. })
                if constraint.as_deref() == Some("workspaces_slug_unique") && attempt < SLUG_RETRIES =>
            {
                attempt += 1;
                continue;
            }
            Err(e) => return Err(Error::Database(e)),
        }
    };

    let mut memberships = Memberships::new(&mut *conn);
    memberships
        .create(&MembershipCreateDBRequest {
            workspace_id: workspace.id,
            user_id: owner_id,
            role: WorkspaceRole::Admin,
            is_owner: true,
        })
        .await?;

    info!(workspace_id = %workspace.id, "Created workspace");
    Ok(workspace)
}

/// Auto-provision the personal workspace a user gets at signup (or on first
/// sight via the SSO proxy), and remember it as their current workspace.
#[instrument(skip(conn, user), fields(user_id = %user.id), err)]
pub async fn provision_personal_workspace(conn: &mut PgConnection, user: &UserDBResponse) -> Result<WorkspaceDBResponse> {
    let base = user
        .display_name
        .clone()
        .unwrap_or_else(|| user.email.split('@').next().unwrap_or("personal").to_string());
    let name = format!("{base}'s workspace");

    let workspace = create_workspace(conn, &name, user.id).await?;

    let mut users = Users::new(&mut *conn);
    users.remember_workspace(user.id, workspace.id).await?;

    Ok(workspace)
}
