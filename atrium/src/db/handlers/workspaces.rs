//! Database repository for workspaces.

use crate::api::models::members::WorkspaceRole;
use crate::api::models::workspaces::Plan;
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::workspaces::{WorkspaceCreateDBRequest, WorkspaceDBResponse, WorkspaceUpdateDBRequest},
};
use crate::types::{abbrev_uuid, UserId, WorkspaceId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use tracing::instrument;

/// Filter for listing workspaces (superadmin overview)
#[derive(Debug, Clone)]
pub struct WorkspaceFilter {
    pub skip: i64,
    pub limit: i64,
}

impl WorkspaceFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

/// A workspace together with the caller's membership, for own-workspace listings
#[derive(Debug, Clone, FromRow)]
pub struct WorkspaceWithRole {
    #[sqlx(flatten)]
    pub workspace: WorkspaceDBResponse,
    pub role: WorkspaceRole,
    pub is_owner: bool,
}

pub struct Workspaces<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Workspaces<'c> {
    type CreateRequest = WorkspaceCreateDBRequest;
    type UpdateRequest = WorkspaceUpdateDBRequest;
    type Response = WorkspaceDBResponse;
    type Id = WorkspaceId;
    type Filter = WorkspaceFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let workspace = sqlx::query_as::<_, WorkspaceDBResponse>(
            r#"
            INSERT INTO workspaces (name, slug, owner_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.slug)
        .bind(request.owner_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(workspace)
    }

    #[instrument(skip(self), fields(workspace_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let workspace = sqlx::query_as::<_, WorkspaceDBResponse>("SELECT * FROM workspaces WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(workspace)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let workspaces = sqlx::query_as::<_, WorkspaceDBResponse>(
            "SELECT * FROM workspaces ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(workspaces)
    }

    /// Delete a workspace. Memberships, API keys, and remembered-workspace
    /// references go with it via the schema's cascades.
    #[instrument(skip(self), fields(workspace_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM workspaces WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(workspace_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let workspace = sqlx::query_as::<_, WorkspaceDBResponse>(
            r#"
            UPDATE workspaces SET
                name = COALESCE($2, name),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(workspace)
    }
}

impl<'c> Workspaces<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// All workspaces the user belongs to, with their role, newest first
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_for_user(&mut self, user_id: UserId) -> Result<Vec<WorkspaceWithRole>> {
        let workspaces = sqlx::query_as::<_, WorkspaceWithRole>(
            r#"
            SELECT w.*, m.role, m.is_owner FROM workspaces w
            INNER JOIN memberships m ON w.id = m.workspace_id
            WHERE m.user_id = $1
            ORDER BY w.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(workspaces)
    }

    /// Move a workspace onto a plan. Used by checkout fulfilment (upgrade,
    /// with customer id and timestamp) and webhook downgrades.
    #[instrument(skip(self), fields(workspace_id = %abbrev_uuid(&id), plan = ?plan), err)]
    pub async fn set_plan(
        &mut self,
        id: WorkspaceId,
        plan: Plan,
        billing_customer_id: Option<&str>,
        upgraded_at: Option<DateTime<Utc>>,
    ) -> Result<WorkspaceDBResponse> {
        let workspace = sqlx::query_as::<_, WorkspaceDBResponse>(
            r#"
            UPDATE workspaces SET
                plan = $2,
                billing_customer_id = COALESCE($3, billing_customer_id),
                upgraded_at = COALESCE($4, upgraded_at),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(plan)
        .bind(billing_customer_id)
        .bind(upgraded_at)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(workspace)
    }

    /// Look up the workspace attached to a billing customer, for webhook
    /// downgrade flows.
    #[instrument(skip(self), fields(customer = %billing_customer_id), err)]
    pub async fn find_by_billing_customer(&mut self, billing_customer_id: &str) -> Result<Option<WorkspaceDBResponse>> {
        let workspace = sqlx::query_as::<_, WorkspaceDBResponse>("SELECT * FROM workspaces WHERE billing_customer_id = $1")
            .bind(billing_customer_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(workspace)
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workspaces").fetch_one(&mut *self.db).await?;

        Ok(count)
    }

    #[instrument(skip(self), err)]
    pub async fn count_pro(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workspaces WHERE plan = 'pro'")
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}
