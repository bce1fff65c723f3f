//! Workspace CRUD and switching handlers.

use crate::api::models::users::CurrentUser;
use crate::api::models::workspaces::{WorkspaceCreate, WorkspaceResponse, WorkspaceUpdate};
use crate::db::handlers::{Repository as _, Workspaces};
use crate::db::models::workspaces::WorkspaceUpdateDBRequest;
use crate::errors::{Error, Result};
use crate::workspaces::guard::{role, WorkspaceScope};
use crate::workspaces::create_workspace as create_workspace_with_owner;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

#[utoipa::path(
    get,
    path = "/workspaces",
    tag = "workspaces",
    summary = "List the caller's workspaces",
    responses(
        (status = 200, description = "Workspaces with the caller's role in each", body = Vec<WorkspaceResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_workspaces(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<Vec<WorkspaceResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut workspaces = Workspaces::new(&mut conn);

    let rows = workspaces.list_for_user(current_user.id).await?;
    let response = rows
        .into_iter()
        .map(|row| WorkspaceResponse::from(row.workspace).with_role(row.role))
        .collect();

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/workspaces",
    tag = "workspaces",
    summary = "Create a workspace",
    request_body = WorkspaceCreate,
    responses(
        (status = 201, description = "Workspace created; the caller becomes its owner", body = WorkspaceResponse),
        (status = 400, description = "Invalid name"),
        (status = 401, description = "Unauthorized")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_workspace(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(create): Json<WorkspaceCreate>,
) -> Result<(StatusCode, Json<WorkspaceResponse>)> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let workspace = create_workspace_with_owner(&mut tx, &create.name, current_user.id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(WorkspaceResponse::from(workspace))))
}

#[utoipa::path(
    get,
    path = "/workspaces/{workspace_id}",
    tag = "workspaces",
    summary = "Get the current workspace",
    params(("workspace_id" = uuid::Uuid, Path, description = "Workspace ID")),
    responses(
        (status = 200, description = "Workspace details", body = WorkspaceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Workspace not found")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_workspace(scope: WorkspaceScope<role::Member>) -> Result<Json<WorkspaceResponse>> {
    let role = scope.role;
    let context = scope.into_context();
    Ok(Json(WorkspaceResponse::from(context.workspace).with_role(role)))
}

#[utoipa::path(
    get,
    path = "/workspaces/current",
    tag = "workspaces",
    summary = "Get the remembered (or only) workspace",
    responses(
        (status = 200, description = "The current workspace", body = WorkspaceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No workspaces"),
        (status = 409, description = "Several workspaces and none selected")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_current_workspace(scope: WorkspaceScope<role::Member>) -> Result<Json<WorkspaceResponse>> {
    // No workspace_id in this route: the guard resolves the remembered
    // workspace, or the single one, or reports selection-required.
    let role = scope.role;
    let context = scope.into_context();
    Ok(Json(WorkspaceResponse::from(context.workspace).with_role(role)))
}

#[utoipa::path(
    patch,
    path = "/workspaces/{workspace_id}",
    tag = "workspaces",
    summary = "Update workspace details (admin only)",
    params(("workspace_id" = uuid::Uuid, Path, description = "Workspace ID")),
    request_body = WorkspaceUpdate,
    responses(
        (status = 200, description = "Updated workspace", body = WorkspaceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Insufficient role"),
        (status = 404, description = "Workspace not found")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_workspace(
    State(state): State<AppState>,
    scope: WorkspaceScope<role::Admin>,
    Json(update): Json<WorkspaceUpdate>,
) -> Result<Json<WorkspaceResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut workspaces = Workspaces::new(&mut conn);

    let workspace = workspaces
        .update(scope.workspace_id(), &WorkspaceUpdateDBRequest { name: update.name })
        .await?;

    Ok(Json(WorkspaceResponse::from(workspace).with_role(scope.role)))
}

#[utoipa::path(
    delete,
    path = "/workspaces/{workspace_id}",
    tag = "workspaces",
    summary = "Delete a workspace (owner only)",
    params(("workspace_id" = uuid::Uuid, Path, description = "Workspace ID")),
    responses(
        (status = 204, description = "Workspace and all its data deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Workspace not found")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_workspace(State(state): State<AppState>, scope: WorkspaceScope<role::Admin>) -> Result<StatusCode> {
    // Destruction is reserved for the owner; admins manage, owners destroy.
    if !scope.is_owner {
        return Err(Error::OwnerRequired);
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut workspaces = Workspaces::new(&mut conn);

    if workspaces.delete(scope.workspace_id()).await? {
        info!(workspace_id = %scope.workspace_id(), "Deleted workspace");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::WorkspaceNotFound {
            workspace_id: Some(scope.workspace_id()),
        })
    }
}

#[utoipa::path(
    post,
    path = "/workspaces/{workspace_id}/switch",
    tag = "workspaces",
    summary = "Switch the remembered workspace",
    params(("workspace_id" = uuid::Uuid, Path, description = "Workspace ID")),
    responses(
        (status = 200, description = "Now the current workspace", body = WorkspaceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Workspace not found")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn switch_workspace(scope: WorkspaceScope<role::Member>) -> Result<Json<WorkspaceResponse>> {
    // The guard has already verified membership and persisted the remembered
    // workspace; switching is just that side effect made explicit.
    let role = scope.role;
    let context = scope.into_context();
    Ok(Json(WorkspaceResponse::from(context.workspace).with_role(role)))
}
