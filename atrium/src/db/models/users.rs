//! Database models for users.

use crate::types::{UserId, WorkspaceId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    /// None for users provisioned by an SSO proxy (no usable password)
    pub password_hash: Option<String>,
    pub is_superadmin: bool,
    pub auth_source: String,
}

/// Database request for updating a user
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub display_name: Option<String>,
    pub password_hash: Option<String>,
    pub active: Option<bool>,
}

/// Database response for a user
#[derive(Debug, Clone, FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub password_hash: Option<String>,
    pub is_superadmin: bool,
    pub active: bool,
    pub auth_source: String,
    /// The remembered workspace: written on successful resolution and on
    /// explicit switch, read by the resolver when no workspace id is given.
    pub last_workspace_id: Option<WorkspaceId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserDBResponse {
    /// OAuth/SSO users have no password they actually know
    pub fn has_usable_password(&self) -> bool {
        self.password_hash.is_some()
    }
}
