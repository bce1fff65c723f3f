//! User profile and superadmin platform handlers.

use crate::api::models::pagination::Pagination;
use crate::api::models::users::{CurrentUser, PlatformStats, ProfileUpdate, UserResponse};
use crate::auth::current_user::require_superadmin;
use crate::db::handlers::{users::UserFilter, Repository as _, Users, Workspaces};
use crate::db::models::users::UserUpdateDBRequest;
use crate::errors::{Error, Result};
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

/// Query parameters for listing users
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Case-insensitive substring search on email, username, and display name
    pub search: Option<String>,
}

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    summary = "Get the current user's profile",
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_profile(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    match users.get_by_id(current_user.id).await? {
        Some(user) => Ok(Json(UserResponse::from(user))),
        None => Err(Error::Unauthenticated { message: None }),
    }
}

#[utoipa::path(
    patch,
    path = "/users/me",
    tag = "users",
    summary = "Update the current user's profile",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    let user = users
        .update(
            current_user.id,
            &UserUpdateDBRequest {
                display_name: update.display_name,
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List all users (superadmin only)",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "List of users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a superadmin")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>> {
    require_superadmin(&current_user)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    let mut filter = UserFilter::new(query.pagination.skip(), query.pagination.limit());
    if let Some(search) = query.search {
        filter = filter.with_search(search);
    }

    let users = users.list(&filter).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "users",
    summary = "Platform statistics (superadmin only)",
    responses(
        (status = 200, description = "Platform statistics", body = PlatformStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not a superadmin")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn platform_stats(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<PlatformStats>> {
    require_superadmin(&current_user)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let total_users = Users::new(&mut conn).count().await?;
    let mut workspaces = Workspaces::new(&mut conn);
    let total_workspaces = workspaces.count().await?;
    let pro_workspaces = workspaces.count_pro().await?;

    Ok(Json(PlatformStats {
        total_users,
        total_workspaces,
        pro_workspaces,
    }))
}
