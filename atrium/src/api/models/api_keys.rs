//! API request/response models for workspace API keys.

use crate::db::models::api_keys::ApiKeyDBResponse;
use crate::types::ApiKeyId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request to create a workspace API key
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ApiKeyCreate {
    pub name: String,
}

/// API key metadata. The key material itself is only returned at creation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiKeyResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ApiKeyId,
    pub name: String,
    pub prefix: String,
    pub is_active: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ApiKeyDBResponse> for ApiKeyResponse {
    fn from(db: ApiKeyDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            prefix: db.prefix,
            is_active: db.is_active,
            last_used_at: db.last_used_at,
            created_at: db.created_at,
        }
    }
}

/// Creation response: metadata plus the full key, shown exactly once
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiKeyCreated {
    /// The full secret key. Store it now - it cannot be retrieved again.
    pub key: String,
    #[serde(flatten)]
    pub info: ApiKeyResponse,
}
