//! API request/response models for workspace memberships.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Role of a user within one workspace.
///
/// Roles form a total order (`member < admin`, via the derive on declaration
/// order), so a guard requiring `member` is satisfied by an `admin`. Owner
/// protection is a separate flag on the membership, not a third tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema)]
#[sqlx(type_name = "workspace_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceRole {
    Member,
    Admin,
}

impl fmt::Display for WorkspaceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceRole::Member => write!(f, "member"),
            WorkspaceRole::Admin => write!(f, "admin"),
        }
    }
}

/// Request to add a member to a workspace.
///
/// If no user with the email exists yet, one is created (with the given
/// password, or a random unusable one when omitted).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MemberAdd {
    pub email: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub password: Option<String>,
    /// Defaults to `member`; only an existing admin can elevate
    pub role: Option<WorkspaceRole>,
}

/// Request to change a member's role
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MemberRoleUpdate {
    pub role: WorkspaceRole,
}

/// A workspace member with their user details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberResponse {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub email: String,
    pub username: String,
    pub display_name: Option<String>,
    pub role: WorkspaceRole,
    pub is_owner: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_total_order() {
        assert!(WorkspaceRole::Member < WorkspaceRole::Admin);
        assert!(WorkspaceRole::Admin >= WorkspaceRole::Member);
        assert!(WorkspaceRole::Admin >= WorkspaceRole::Admin);
        assert!(!(WorkspaceRole::Member >= WorkspaceRole::Admin));
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&WorkspaceRole::Admin).unwrap(), "\"admin\"");
        let role: WorkspaceRole = serde_json::from_str("\"member\"").unwrap();
        assert_eq!(role, WorkspaceRole::Member);
    }
}
