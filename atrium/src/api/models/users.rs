//! API request/response models for users and authentication.

use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Self-service signup request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    /// Defaults to the local part of the email when omitted
    pub username: Option<String>,
    pub password: String,
    pub display_name: Option<String>,
}

/// Login request for native authentication
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password change request (requires the current password)
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Profile update request. Email is immutable: memberships and billing
/// records key off it, so changing it is not offered.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
}

/// User response model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub is_superadmin: bool,
    pub active: bool,
    pub auth_source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            display_name: db.display_name,
            is_superadmin: db.is_superadmin,
            active: db.active,
            auth_source: db.auth_source,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// The authenticated caller, as carried through request handling.
///
/// This is what the session token encodes and what the auth extractor
/// produces; it never includes credential material.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub is_superadmin: bool,
}

impl CurrentUser {
    /// Best available display name for UI purposes
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username,
            email: db.email,
            display_name: db.display_name,
            is_superadmin: db.is_superadmin,
        }
    }
}

/// Platform statistics for the superadmin overview
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlatformStats {
    pub total_users: i64,
    pub total_workspaces: i64,
    pub pro_workspaces: i64,
}
