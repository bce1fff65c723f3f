//! Database models for workspaces.

use crate::api::models::workspaces::Plan;
use crate::types::{UserId, WorkspaceId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a workspace
#[derive(Debug, Clone)]
pub struct WorkspaceCreateDBRequest {
    pub name: String,
    pub slug: String,
    pub owner_id: UserId,
}

/// Database request for updating workspace details
#[derive(Debug, Clone, Default)]
pub struct WorkspaceUpdateDBRequest {
    pub name: Option<String>,
}

/// Database response for a workspace
#[derive(Debug, Clone, FromRow)]
pub struct WorkspaceDBResponse {
    pub id: WorkspaceId,
    pub name: String,
    pub slug: String,
    pub owner_id: UserId,
    pub plan: Plan,
    /// Opaque customer reference at the billing provider
    pub billing_customer_id: Option<String>,
    pub upgraded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkspaceDBResponse {
    pub fn is_pro(&self) -> bool {
        self.plan.is_pro()
    }
}

/// Generate a URL-safe slug from a workspace name.
///
/// Lowercases, maps runs of non-alphanumeric characters to single dashes, and
/// trims leading/trailing dashes. Collisions are handled by the caller (the
/// repository appends a short random suffix on unique violations).
pub fn generate_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true; // suppress a leading dash
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
