//! Database models for workspace memberships.

use crate::api::models::members::WorkspaceRole;
use crate::types::{UserId, WorkspaceId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a membership
#[derive(Debug, Clone)]
pub struct MembershipCreateDBRequest {
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub role: WorkspaceRole,
    /// Set only for the workspace creator; protected from demotion/removal
    pub is_owner: bool,
}

/// Database response for a membership row
#[derive(Debug, Clone, FromRow)]
pub struct MembershipDBResponse {
    pub workspace_id: WorkspaceId,
    pub user_id: UserId,
    pub role: WorkspaceRole,
    pub is_owner: bool,
    pub created_at: DateTime<Utc>,
}

/// A membership joined with its user row, for member listings
#[derive(Debug, Clone, FromRow)]
pub struct MemberWithUserDBResponse {
    pub user_id: UserId,
    pub email: String,
    pub username: String,
    pub display_name: Option<String>,
    pub role: WorkspaceRole,
    pub is_owner: bool,
    pub created_at: DateTime<Utc>,
}
