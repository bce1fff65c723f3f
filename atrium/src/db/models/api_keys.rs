//! Database models for workspace API keys.

use crate::types::{ApiKeyId, UserId, WorkspaceId};
use crate::workspaces::scoped::WorkspaceOwned;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating an API key
#[derive(Debug, Clone)]
pub struct ApiKeyCreateDBRequest {
    pub workspace_id: WorkspaceId,
    pub created_by: UserId,
    pub name: String,
    pub prefix: String,
    pub key_hash: String,
}

/// Database response for an API key
#[derive(Debug, Clone, FromRow)]
pub struct ApiKeyDBResponse {
    pub id: ApiKeyId,
    pub workspace_id: WorkspaceId,
    pub created_by: UserId,
    pub name: String,
    pub prefix: String,
    pub key_hash: String,
    pub is_active: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl WorkspaceOwned for ApiKeyDBResponse {
    const TABLE: &'static str = "api_keys";
}
