//! Workspace member management handlers.

use crate::api::models::members::{MemberAdd, MemberResponse, MemberRoleUpdate};
use crate::api::models::pagination::Pagination;
use crate::auth::password;
use crate::db::handlers::{Memberships, Repository as _, Users};
use crate::db::models::users::UserCreateDBRequest;
use crate::errors::{Error, Result};
use crate::types::UserId;
use crate::workspaces::guard::{role, WorkspaceScope};
use crate::workspaces::members;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

#[utoipa::path(
    get,
    path = "/workspaces/{workspace_id}/members",
    tag = "members",
    summary = "List workspace members",
    params(
        ("workspace_id" = uuid::Uuid, Path, description = "Workspace ID"),
        Pagination
    ),
    responses(
        (status = 200, description = "Members with their roles", body = Vec<MemberResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Workspace not found")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_members(
    State(state): State<AppState>,
    scope: WorkspaceScope<role::Member>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<MemberResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut memberships = Memberships::new(&mut conn);

    let members = memberships
        .list_with_users(scope.workspace_id(), pagination.skip(), pagination.limit())
        .await?;

    Ok(Json(
        members
            .into_iter()
            .map(|member| MemberResponse {
                user_id: member.user_id,
                email: member.email,
                username: member.username,
                display_name: member.display_name,
                role: member.role,
                is_owner: member.is_owner,
                created_at: member.created_at,
            })
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/workspaces/{workspace_id}/members",
    tag = "members",
    summary = "Add a member (admin only)",
    params(("workspace_id" = uuid::Uuid, Path, description = "Workspace ID")),
    request_body = MemberAdd,
    responses(
        (status = 201, description = "Member added", body = MemberResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Insufficient role"),
        (status = 409, description = "Already a member")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn add_member(
    State(state): State<AppState>,
    scope: WorkspaceScope<role::Admin>,
    Json(request): Json<MemberAdd>,
) -> Result<(StatusCode, Json<MemberResponse>)> {
    let email = request.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::BadRequest {
            message: "A valid email address is required".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut tx);

    // Invite an existing account, or create one on the spot. A user created
    // without a password gets a random unusable one and sets their own via
    // the password-change flow.
    let user = match users.get_user_by_email(&email).await? {
        Some(user) => user,
        None => {
            let password_hash = match &request.password {
                Some(password) => password::hash_string(password)?,
                None => password::hash_string(&password::random_password())?,
            };
            users
                .create(&UserCreateDBRequest {
                    username: request.username.clone().unwrap_or_else(|| email.clone()),
                    email: email.clone(),
                    display_name: request.display_name.clone(),
                    password_hash: Some(password_hash),
                    is_superadmin: false,
                    auth_source: "native".to_string(),
                })
                .await?
        }
    };

    let membership = members::add_member(&mut tx, scope.workspace_id(), user.id, request.role).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    info!(workspace_id = %scope.workspace_id(), user_id = %user.id, "Member added");

    Ok((
        StatusCode::CREATED,
        Json(MemberResponse {
            user_id: user.id,
            email: user.email,
            username: user.username,
            display_name: user.display_name,
            role: membership.role,
            is_owner: membership.is_owner,
            created_at: membership.created_at,
        }),
    ))
}

#[utoipa::path(
    patch,
    path = "/workspaces/{workspace_id}/members/{user_id}",
    tag = "members",
    summary = "Change a member's role (admin only)",
    params(
        ("workspace_id" = uuid::Uuid, Path, description = "Workspace ID"),
        ("user_id" = uuid::Uuid, Path, description = "User ID")
    ),
    request_body = MemberRoleUpdate,
    responses(
        (status = 200, description = "Role updated", body = MemberResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Insufficient role or owner-protected"),
        (status = 404, description = "Membership not found"),
        (status = 409, description = "Would remove the last admin")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_member(
    State(state): State<AppState>,
    scope: WorkspaceScope<role::Admin>,
    Path((_workspace_id, user_id)): Path<(uuid::Uuid, UserId)>,
    Json(request): Json<MemberRoleUpdate>,
) -> Result<Json<MemberResponse>> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let membership = members::update_role(&mut tx, scope.workspace_id(), user_id, request.role).await?;

    let mut users = Users::new(&mut tx);
    let user = users.get_by_id(user_id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: user_id.to_string(),
    })?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(MemberResponse {
        user_id: user.id,
        email: user.email,
        username: user.username,
        display_name: user.display_name,
        role: membership.role,
        is_owner: membership.is_owner,
        created_at: membership.created_at,
    }))
}

#[utoipa::path(
    delete,
    path = "/workspaces/{workspace_id}/members/{user_id}",
    tag = "members",
    summary = "Remove a member (admin only)",
    params(
        ("workspace_id" = uuid::Uuid, Path, description = "Workspace ID"),
        ("user_id" = uuid::Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 400, description = "Cannot remove yourself"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Insufficient role or owner-protected"),
        (status = 404, description = "Membership not found"),
        (status = 409, description = "Would remove the last admin")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn remove_member(
    State(state): State<AppState>,
    scope: WorkspaceScope<role::Admin>,
    Path((_workspace_id, user_id)): Path<(uuid::Uuid, UserId)>,
) -> Result<StatusCode> {
    // Self-removal is rejected outright - except for the owner, who falls
    // through so the transition layer reports the stronger owner protection.
    if user_id == scope.user.id && !scope.is_owner {
        return Err(Error::BadRequest {
            message: "Cannot remove yourself from the workspace".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    members::remove_member(&mut tx, scope.workspace_id(), user_id).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(StatusCode::NO_CONTENT)
}
