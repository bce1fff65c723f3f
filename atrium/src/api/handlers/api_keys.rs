//! Workspace API key handlers.
//!
//! API keys are the template's canonical workspace-owned entity: all reads go
//! through the scoped query helper, so a key id from another tenant behaves
//! exactly like a nonexistent one.

use crate::api::models::api_keys::{ApiKeyCreate, ApiKeyCreated, ApiKeyResponse};
use crate::auth::api_keys::generate_key;
use crate::db::handlers::ApiKeys;
use crate::db::models::api_keys::{ApiKeyCreateDBRequest, ApiKeyDBResponse};
use crate::errors::{Error, Result};
use crate::types::ApiKeyId;
use crate::workspaces::guard::{role, WorkspaceScope};
use crate::workspaces::scoped::ScopedQuery;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

#[utoipa::path(
    get,
    path = "/workspaces/{workspace_id}/api-keys",
    tag = "api-keys",
    summary = "List active API keys",
    params(("workspace_id" = uuid::Uuid, Path, description = "Workspace ID")),
    responses(
        (status = 200, description = "Active keys, newest first", body = Vec<ApiKeyResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Workspace not found")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_api_keys(State(state): State<AppState>, scope: WorkspaceScope<role::Member>) -> Result<Json<Vec<ApiKeyResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut scoped = ScopedQuery::new(&mut conn, &scope);

    let keys: Vec<ApiKeyDBResponse> = scoped.list().await?;
    Ok(Json(
        keys.into_iter().filter(|key| key.is_active).map(ApiKeyResponse::from).collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/workspaces/{workspace_id}/api-keys",
    tag = "api-keys",
    summary = "Create an API key (admin only)",
    params(("workspace_id" = uuid::Uuid, Path, description = "Workspace ID")),
    request_body = ApiKeyCreate,
    responses(
        (status = 201, description = "Key created; the secret is returned exactly once", body = ApiKeyCreated),
        (status = 400, description = "Invalid name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Insufficient role")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_api_key(
    State(state): State<AppState>,
    scope: WorkspaceScope<role::Admin>,
    Json(request): Json<ApiKeyCreate>,
) -> Result<(StatusCode, Json<ApiKeyCreated>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(Error::BadRequest {
            message: "Key name is required".to_string(),
        });
    }

    let (full_key, prefix, key_hash) = generate_key();

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut api_keys = ApiKeys::new(&mut conn);
    let key = api_keys
        .create(&ApiKeyCreateDBRequest {
            workspace_id: scope.workspace_id(),
            created_by: scope.user.id,
            name: name.to_string(),
            prefix,
            key_hash,
        })
        .await?;

    info!(workspace_id = %scope.workspace_id(), key_id = %key.id, "Created API key");

    Ok((
        StatusCode::CREATED,
        Json(ApiKeyCreated {
            key: full_key,
            info: ApiKeyResponse::from(key),
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/workspaces/{workspace_id}/api-keys/{key_id}",
    tag = "api-keys",
    summary = "Revoke an API key (admin only)",
    params(
        ("workspace_id" = uuid::Uuid, Path, description = "Workspace ID"),
        ("key_id" = uuid::Uuid, Path, description = "API key ID")
    ),
    responses(
        (status = 204, description = "Key revoked"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Insufficient role"),
        (status = 404, description = "Key not found in this workspace")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn revoke_api_key(
    State(state): State<AppState>,
    scope: WorkspaceScope<role::Admin>,
    Path((_workspace_id, key_id)): Path<(uuid::Uuid, ApiKeyId)>,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut api_keys = ApiKeys::new(&mut conn);

    if api_keys.revoke(scope.workspace_id(), key_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "API key".to_string(),
            id: key_id.to_string(),
        })
    }
}
