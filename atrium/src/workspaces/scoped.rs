//! The workspace-scoped query helper.
//!
//! Every read/write against workspace-owned entities in handler code goes
//! through [`ScopedQuery`], which appends the resolved workspace's id to every
//! query. Queries that bypass it are a design violation to be caught in code
//! review - there is no row-level security engine underneath.
//!
//! The helper takes the [`WorkspaceContext`] as an explicit constructor
//! argument, so "scoped query without a resolved context" cannot be written:
//! a handler without the guard has no context to pass.

use crate::db::errors::Result;
use crate::types::WorkspaceId;
use crate::workspaces::WorkspaceContext;
use sqlx::{postgres::PgRow, PgConnection, QueryBuilder};
use uuid::Uuid;

/// An entity owned by a workspace: one table, one `workspace_id` column.
pub trait WorkspaceOwned: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin {
    /// Table name; must have `id`, `workspace_id`, and `created_at` columns
    const TABLE: &'static str;
}

/// Query access narrowed to one workspace.
pub struct ScopedQuery<'a> {
    db: &'a mut PgConnection,
    workspace_id: WorkspaceId,
}

impl<'a> ScopedQuery<'a> {
    /// Requires a resolved context - the scoping requirement is visible at
    /// every call site.
    pub fn new(db: &'a mut PgConnection, context: &WorkspaceContext) -> Self {
        Self {
            db,
            workspace_id: context.workspace_id(),
        }
    }

    /// All rows of `T` belonging to the current workspace, newest first
    pub async fn list<T: WorkspaceOwned>(&mut self) -> Result<Vec<T>> {
        let mut query = QueryBuilder::new("SELECT * FROM ");
        query.push(T::TABLE);
        query.push(" WHERE workspace_id = ");
        query.push_bind(self.workspace_id);
        query.push(" ORDER BY created_at DESC");

        let rows = query.build_query_as::<T>().fetch_all(&mut *self.db).await?;
        Ok(rows)
    }

    /// The row of `T` with the given id, only if it belongs to the current
    /// workspace. A row from another tenant behaves as not-found.
    pub async fn get_by_id<T: WorkspaceOwned>(&mut self, id: Uuid) -> Result<Option<T>> {
        let mut query = QueryBuilder::new("SELECT * FROM ");
        query.push(T::TABLE);
        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" AND workspace_id = ");
        query.push_bind(self.workspace_id);

        let row = query.build_query_as::<T>().fetch_optional(&mut *self.db).await?;
        Ok(row)
    }

    /// Delete the row of `T` with the given id, only within the current
    /// workspace. Returns whether a row was deleted.
    pub async fn delete_by_id<T: WorkspaceOwned>(&mut self, id: Uuid) -> Result<bool> {
        let mut query = QueryBuilder::new("DELETE FROM ");
        query.push(T::TABLE);
        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" AND workspace_id = ");
        query.push_bind(self.workspace_id);

        let result = query.build().execute(&mut *self.db).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::ApiKeys;
    use crate::db::models::api_keys::{ApiKeyCreateDBRequest, ApiKeyDBResponse};
    use crate::test_utils::{create_test_user, create_test_workspace, workspace_context};
    use sqlx::PgPool;

    async fn seed_key(pool: &PgPool, workspace_id: WorkspaceId, created_by: uuid::Uuid, name: &str) -> ApiKeyDBResponse {
        let mut conn = pool.acquire().await.unwrap();
        let mut api_keys = ApiKeys::new(&mut conn);
        api_keys
            .create(&ApiKeyCreateDBRequest {
                workspace_id,
                created_by,
                name: name.to_string(),
                prefix: "ak_0000".to_string(),
                key_hash: format!("hash-{name}"),
            })
            .await
            .unwrap()
    }

    #[sqlx::test]
    async fn test_list_is_limited_to_current_workspace(pool: PgPool) {
        let alice = create_test_user(&pool, "alice@example.com").await;
        let bob = create_test_user(&pool, "bob@example.com").await;
        let ws_a = create_test_workspace(&pool, &alice, "A").await;
        let ws_b = create_test_workspace(&pool, &bob, "B").await;

        seed_key(&pool, ws_a.id, alice.id, "alpha").await;
        seed_key(&pool, ws_a.id, alice.id, "beta").await;
        seed_key(&pool, ws_b.id, bob.id, "gamma").await;

        let ctx = workspace_context(&pool, &alice, &ws_a).await;
        let mut conn = pool.acquire().await.unwrap();
        let keys: Vec<ApiKeyDBResponse> = ScopedQuery::new(&mut conn, &ctx).list().await.unwrap();

        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.workspace_id == ws_a.id));
    }

    #[sqlx::test]
    async fn test_get_by_id_refuses_cross_tenant_rows(pool: PgPool) {
        let alice = create_test_user(&pool, "alice@example.com").await;
        let bob = create_test_user(&pool, "bob@example.com").await;
        let ws_a = create_test_workspace(&pool, &alice, "A").await;
        let ws_b = create_test_workspace(&pool, &bob, "B").await;

        let a_key = seed_key(&pool, ws_a.id, alice.id, "alpha").await;
        let b_key = seed_key(&pool, ws_b.id, bob.id, "gamma").await;

        let ctx = workspace_context(&pool, &alice, &ws_a).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut scoped = ScopedQuery::new(&mut conn, &ctx);

        // Own row: found
        let found: Option<ApiKeyDBResponse> = scoped.get_by_id(a_key.id).await.unwrap();
        assert!(found.is_some());

        // The other tenant's id behaves exactly like a nonexistent one
        let foreign: Option<ApiKeyDBResponse> = scoped.get_by_id(b_key.id).await.unwrap();
        assert!(foreign.is_none());
        let missing: Option<ApiKeyDBResponse> = scoped.get_by_id(uuid::Uuid::new_v4()).await.unwrap();
        assert!(missing.is_none());
    }

    #[sqlx::test]
    async fn test_delete_by_id_cannot_cross_tenants(pool: PgPool) {
        let alice = create_test_user(&pool, "alice@example.com").await;
        let bob = create_test_user(&pool, "bob@example.com").await;
        let ws_a = create_test_workspace(&pool, &alice, "A").await;
        let ws_b = create_test_workspace(&pool, &bob, "B").await;

        let b_key = seed_key(&pool, ws_b.id, bob.id, "gamma").await;

        let ctx = workspace_context(&pool, &alice, &ws_a).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut scoped = ScopedQuery::new(&mut conn, &ctx);

        // Deleting the other tenant's row from A's scope is a no-op
        let deleted = scoped.delete_by_id::<ApiKeyDBResponse>(b_key.id).await.unwrap();
        assert!(!deleted);

        // The row is still there for its rightful owner
        let ctx_b = workspace_context(&pool, &bob, &ws_b).await;
        let mut conn_b = pool.acquire().await.unwrap();
        let still_there: Option<ApiKeyDBResponse> = ScopedQuery::new(&mut conn_b, &ctx_b).get_by_id(b_key.id).await.unwrap();
        assert!(still_there.is_some());
    }
}
