//! Database repository for workspace memberships.
//!
//! This repository provides the raw row operations. The owner-protection and
//! last-admin rules live in [`crate::workspaces::members`], which callers
//! should use for role transitions.

use crate::api::models::members::WorkspaceRole;
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::memberships::{MemberWithUserDBResponse, MembershipCreateDBRequest, MembershipDBResponse},
};
use crate::types::{abbrev_uuid, UserId, WorkspaceId};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing memberships of one workspace
#[derive(Debug, Clone)]
pub struct MembershipFilter {
    pub workspace_id: WorkspaceId,
    pub skip: i64,
    pub limit: i64,
}

impl MembershipFilter {
    pub fn new(workspace_id: WorkspaceId, skip: i64, limit: i64) -> Self {
        Self { workspace_id, skip, limit }
    }
}

/// Database request for changing a membership's role
#[derive(Debug, Clone)]
pub struct MembershipUpdateDBRequest {
    pub role: WorkspaceRole,
}

pub struct Memberships<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Memberships<'c> {
    type CreateRequest = MembershipCreateDBRequest;
    type UpdateRequest = MembershipUpdateDBRequest;
    type Response = MembershipDBResponse;
    /// Composite key: (workspace, user)
    type Id = (WorkspaceId, UserId);
    type Filter = MembershipFilter;

    #[instrument(
        skip(self, request),
        fields(workspace_id = %abbrev_uuid(&request.workspace_id), user_id = %abbrev_uuid(&request.user_id), role = %request.role),
        err
    )]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        match sqlx::query_as::<_, MembershipDBResponse>(
            r#"
            INSERT INTO memberships (workspace_id, user_id, role, is_owner)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.workspace_id)
        .bind(request.user_id)
        .bind(request.role)
        .bind(request.is_owner)
        .fetch_one(&mut *self.db)
        .await
        {
            Ok(membership) => Ok(membership),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                // Foreign key violation means either user or workspace doesn't exist
                Err(DbError::NotFound)
            }
            Err(e) => Err(DbError::from(e)),
        }
    }

    #[instrument(skip(self), fields(workspace_id = %abbrev_uuid(&id.0), user_id = %abbrev_uuid(&id.1)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let membership = sqlx::query_as::<_, MembershipDBResponse>(
            "SELECT * FROM memberships WHERE workspace_id = $1 AND user_id = $2",
        )
        .bind(id.0)
        .bind(id.1)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(membership)
    }

    #[instrument(skip(self, filter), fields(workspace_id = %abbrev_uuid(&filter.workspace_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let memberships = sqlx::query_as::<_, MembershipDBResponse>(
            "SELECT * FROM memberships WHERE workspace_id = $1 ORDER BY created_at LIMIT $2 OFFSET $3",
        )
        .bind(filter.workspace_id)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(memberships)
    }

    #[instrument(skip(self), fields(workspace_id = %abbrev_uuid(&id.0), user_id = %abbrev_uuid(&id.1)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM memberships WHERE workspace_id = $1 AND user_id = $2")
            .bind(id.0)
            .bind(id.1)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(workspace_id = %abbrev_uuid(&id.0), user_id = %abbrev_uuid(&id.1)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let membership = sqlx::query_as::<_, MembershipDBResponse>(
            r#"
            UPDATE memberships SET role = $3
            WHERE workspace_id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id.0)
        .bind(id.1)
        .bind(request.role)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(membership)
    }
}

impl<'c> Memberships<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Members of a workspace joined with their user rows, oldest first
    #[instrument(skip(self), fields(workspace_id = %abbrev_uuid(&workspace_id)), err)]
    pub async fn list_with_users(&mut self, workspace_id: WorkspaceId, skip: i64, limit: i64) -> Result<Vec<MemberWithUserDBResponse>> {
        let members = sqlx::query_as::<_, MemberWithUserDBResponse>(
            r#"
            SELECT m.user_id, u.email, u.username, u.display_name, m.role, m.is_owner, m.created_at
            FROM memberships m
            INNER JOIN users u ON m.user_id = u.id
            WHERE m.workspace_id = $1
            ORDER BY m.created_at
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(workspace_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(members)
    }

    /// IDs of every workspace the user belongs to, newest membership first
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn workspace_ids_for_user(&mut self, user_id: UserId) -> Result<Vec<WorkspaceId>> {
        let ids: Vec<WorkspaceId> =
            sqlx::query_scalar("SELECT workspace_id FROM memberships WHERE user_id = $1 ORDER BY created_at DESC")
                .bind(user_id)
                .fetch_all(&mut *self.db)
                .await?;

        Ok(ids)
    }

    #[instrument(skip(self), fields(workspace_id = %abbrev_uuid(&workspace_id)), err)]
    pub async fn count_members(&mut self, workspace_id: WorkspaceId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM memberships WHERE workspace_id = $1")
            .bind(workspace_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    #[instrument(skip(self), fields(workspace_id = %abbrev_uuid(&workspace_id)), err)]
    pub async fn count_admins(&mut self, workspace_id: WorkspaceId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM memberships WHERE workspace_id = $1 AND role = 'admin'")
            .bind(workspace_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}
