//! Database repository for workspace API keys.
//!
//! Reads go through [`crate::workspaces::scoped::ScopedQuery`]; this
//! repository covers creation and revocation, both parameterized by the
//! workspace id from the resolved context.

use crate::db::{
    errors::Result,
    models::api_keys::{ApiKeyCreateDBRequest, ApiKeyDBResponse},
};
use crate::types::{abbrev_uuid, ApiKeyId, WorkspaceId};
use sqlx::PgConnection;
use tracing::instrument;

pub struct ApiKeys<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ApiKeys<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(
        skip(self, request),
        fields(workspace_id = %abbrev_uuid(&request.workspace_id), name = %request.name),
        err
    )]
    pub async fn create(&mut self, request: &ApiKeyCreateDBRequest) -> Result<ApiKeyDBResponse> {
        let key = sqlx::query_as::<_, ApiKeyDBResponse>(
            r#"
            INSERT INTO api_keys (workspace_id, created_by, name, prefix, key_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.workspace_id)
        .bind(request.created_by)
        .bind(&request.name)
        .bind(&request.prefix)
        .bind(&request.key_hash)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(key)
    }

    /// Soft-revoke a key. The workspace id comes from the resolved context, so
    /// a key belonging to another tenant behaves as absent.
    #[instrument(skip(self), fields(workspace_id = %abbrev_uuid(&workspace_id), key_id = %abbrev_uuid(&id)), err)]
    pub async fn revoke(&mut self, workspace_id: WorkspaceId, id: ApiKeyId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE api_keys SET is_active = FALSE WHERE id = $1 AND workspace_id = $2 AND is_active",
        )
        .bind(id)
        .bind(workspace_id)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
