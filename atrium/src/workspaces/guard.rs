//! The workspace access guard.
//!
//! [`WorkspaceScope`] is an axum extractor parameterized by the required role:
//!
//! ```ignore
//! async fn team_page(
//!     State(state): State<AppState>,
//!     scope: WorkspaceScope<role::Admin>,
//! ) -> Result<...> {
//!     // scope derefs to WorkspaceContext
//!     let workspace_id = scope.workspace_id();
//! }
//! ```
//!
//! The guard authenticates the caller, runs the resolver on the optional
//! `workspace_id` path parameter, compares the membership role against the
//! required rank, and publishes the request-scoped [`WorkspaceContext`].
//! Failures keep their identity: authentication failures are 401, resolution
//! failures are 404/409, and only a real rank shortfall becomes 403.

use crate::api::models::members::WorkspaceRole;
use crate::api::models::users::CurrentUser;
use crate::db::handlers::Users;
use crate::errors::{Error, Result};
use crate::types::WorkspaceId;
use crate::workspaces::{resolver, WorkspaceContext};
use crate::AppState;
use axum::extract::{FromRequestParts, RawPathParams};
use axum::http::request::Parts;
use std::marker::PhantomData;
use std::ops::Deref;
use tracing::instrument;

/// A required role rank, expressed as a type so handlers declare their
/// requirement in the signature.
pub trait RoleRequirement: Send + Sync + 'static {
    const REQUIRED: WorkspaceRole;
}

/// Marker types for the two role ranks
pub mod role {
    use super::RoleRequirement;
    use crate::api::models::members::WorkspaceRole;

    /// Any member of the workspace
    pub struct Member;

    /// Workspace admins only (`admin` implies `member`, not vice versa)
    pub struct Admin;

    impl RoleRequirement for Member {
        const REQUIRED: WorkspaceRole = WorkspaceRole::Member;
    }

    impl RoleRequirement for Admin {
        const REQUIRED: WorkspaceRole = WorkspaceRole::Admin;
    }
}

/// The access guard extractor. See the module docs.
pub struct WorkspaceScope<R: RoleRequirement> {
    pub context: WorkspaceContext,
    _role: PhantomData<fn() -> R>,
}

impl<R: RoleRequirement> Deref for WorkspaceScope<R> {
    type Target = WorkspaceContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

impl<R: RoleRequirement> WorkspaceScope<R> {
    pub fn into_context(self) -> WorkspaceContext {
        self.context
    }
}

/// Pull the optional `workspace_id` path parameter out of the matched route.
/// Absence (or an unrouted request) just means implicit resolution.
async fn explicit_workspace_id(parts: &mut Parts, state: &AppState) -> Result<Option<WorkspaceId>> {
    let params = match RawPathParams::from_request_parts(parts, state).await {
        Ok(params) => params,
        Err(_) => return Ok(None),
    };

    for (name, value) in &params {
        if name == "workspace_id" {
            let id = value.parse::<WorkspaceId>().map_err(|_| Error::BadRequest {
                message: format!("Invalid workspace id: {value}"),
            })?;
            return Ok(Some(id));
        }
    }
    Ok(None)
}

impl<R: RoleRequirement> FromRequestParts<AppState> for WorkspaceScope<R> {
    type Rejection = Error;

    #[instrument(skip(parts, state), fields(required = %R::REQUIRED))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Authentication first; its failure must surface as 401, never as a
        // masked 403.
        let user = CurrentUser::from_request_parts(parts, state).await?;

        let explicit = explicit_workspace_id(parts, state).await?;

        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

        // Resolver failures propagate verbatim (404 / 409)
        let resolved = resolver::resolve(&mut conn, user.id, explicit).await?;

        if resolved.membership.role < R::REQUIRED {
            return Err(Error::InsufficientRole { required: R::REQUIRED });
        }

        // Remember the resolved workspace for the next implicit request.
        // Last-writer-wins; a failure here must not fail the request's
        // authorization, but surfacing it keeps storage errors visible.
        let mut users = Users::new(&mut conn);
        users.remember_workspace(user.id, resolved.workspace.id).await?;

        Ok(WorkspaceScope {
            context: WorkspaceContext {
                user,
                role: resolved.membership.role,
                is_owner: resolved.membership.is_owner,
                workspace: resolved.workspace,
            },
            _role: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::workspaces::Plan;
    use crate::db::models::workspaces::WorkspaceDBResponse;
    use chrono::Utc;
    use uuid::Uuid;

    fn context_with_plan(plan: Plan) -> WorkspaceContext {
        WorkspaceContext {
            user: CurrentUser {
                id: Uuid::new_v4(),
                username: "u".to_string(),
                email: "u@example.com".to_string(),
                display_name: None,
                is_superadmin: false,
            },
            workspace: WorkspaceDBResponse {
                id: Uuid::new_v4(),
                name: "W".to_string(),
                slug: "w".to_string(),
                owner_id: Uuid::new_v4(),
                plan,
                billing_customer_id: None,
                upgraded_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            role: WorkspaceRole::Member,
            is_owner: false,
        }
    }

    #[test]
    fn test_rank_comparison_is_monotone() {
        // admin satisfies a member requirement; the reverse does not hold
        assert!(WorkspaceRole::Admin >= role::Member::REQUIRED);
        assert!(WorkspaceRole::Admin >= role::Admin::REQUIRED);
        assert!(WorkspaceRole::Member >= role::Member::REQUIRED);
        assert!(WorkspaceRole::Member < role::Admin::REQUIRED);
    }

    #[test]
    fn test_require_pro_gate() {
        let free = context_with_plan(Plan::Free);
        let err = free.require_pro().unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::PAYMENT_REQUIRED);

        let pro = context_with_plan(Plan::Pro);
        assert!(pro.require_pro().is_ok());
    }
}
