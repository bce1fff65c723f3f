//! API request/response models for workspaces.

use crate::api::models::members::WorkspaceRole;
use crate::db::models::workspaces::WorkspaceDBResponse;
use crate::types::{UserId, WorkspaceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Subscription plan of a workspace.
///
/// The plan is the sole gate for Pro-only behavior; billing webhooks move
/// workspaces between the two values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "workspace_plan", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
}

impl Plan {
    pub fn is_pro(&self) -> bool {
        matches!(self, Plan::Pro)
    }
}

/// Request to create a workspace
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WorkspaceCreate {
    pub name: String,
}

/// Request to update workspace details
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WorkspaceUpdate {
    pub name: Option<String>,
}

/// Workspace response model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkspaceResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: WorkspaceId,
    pub name: String,
    pub slug: String,
    #[schema(value_type = String, format = "uuid")]
    pub owner_id: UserId,
    pub plan: Plan,
    pub is_pro: bool,
    pub upgraded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// The caller's role in this workspace (included when listing own workspaces)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<WorkspaceRole>,
}

impl From<WorkspaceDBResponse> for WorkspaceResponse {
    fn from(db: WorkspaceDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            slug: db.slug,
            owner_id: db.owner_id,
            is_pro: db.plan.is_pro(),
            plan: db.plan,
            upgraded_at: db.upgraded_at,
            created_at: db.created_at,
            role: None,
        }
    }
}

impl WorkspaceResponse {
    /// Attach the caller's role for own-workspace listings
    pub fn with_role(mut self, role: WorkspaceRole) -> Self {
        self.role = Some(role);
        self
    }
}

/// Response returned by billing endpoints that mint hosted-page sessions
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HostedPageResponse {
    /// URL of the provider-hosted page the client should redirect to
    pub url: String,
}
