//! Shared fixtures for tests.

use crate::api::models::members::WorkspaceRole;
use crate::api::models::users::CurrentUser;
use crate::db::handlers::{Memberships, Repository as _, Users};
use crate::db::models::memberships::MembershipCreateDBRequest;
use crate::db::models::users::{UserCreateDBRequest, UserDBResponse};
use crate::db::models::workspaces::WorkspaceDBResponse;
use crate::types::{UserId, WorkspaceId};
use crate::workspaces::WorkspaceContext;
use crate::{AppState, Config};
use sqlx::PgPool;

/// Config suitable for tests: native auth with a fixed secret, plain-HTTP
/// cookies, proxy-header auth off unless a test enables it.
pub fn create_test_config() -> Config {
    let mut config = Config {
        secret_key: Some("test-secret-key".to_string()),
        ..Default::default()
    };
    config.auth.native.session.cookie_secure = false;
    config.auth.proxy_header.enabled = false;
    config
}

/// Build an `AppState` over the test pool
pub async fn create_test_app_state(pool: PgPool, config: Config) -> AppState {
    let billing = config.billing.clone().map(|billing_config| {
        let provider: std::sync::Arc<dyn crate::billing::BillingProvider> = crate::billing::create_provider(billing_config).into();
        provider
    });
    AppState::builder().db(pool).config(config).maybe_billing(billing).build()
}

/// Build a test server over the full router
pub async fn create_test_server(pool: PgPool, config: Config) -> axum_test::TestServer {
    let state = create_test_app_state(pool, config).await;
    let router = crate::build_router(&state).expect("Failed to build router");
    axum_test::TestServer::new(router).expect("Failed to create test server")
}

/// Create a user with a known password (`password123!`)
pub async fn create_test_user(pool: &PgPool, email: &str) -> UserDBResponse {
    let mut conn = pool.acquire().await.unwrap();
    let mut users = Users::new(&mut conn);
    users
        .create(&UserCreateDBRequest {
            username: email.to_string(),
            email: email.to_string(),
            display_name: None,
            password_hash: Some(crate::auth::password::hash_string("password123!").unwrap()),
            is_superadmin: false,
            auth_source: "native".to_string(),
        })
        .await
        .expect("Failed to create test user")
}

/// Create a superadmin user
pub async fn create_test_superadmin(pool: &PgPool, email: &str) -> UserDBResponse {
    let mut conn = pool.acquire().await.unwrap();
    let mut users = Users::new(&mut conn);
    users
        .create(&UserCreateDBRequest {
            username: email.to_string(),
            email: email.to_string(),
            display_name: None,
            password_hash: Some(crate::auth::password::hash_string("password123!").unwrap()),
            is_superadmin: true,
            auth_source: "system".to_string(),
        })
        .await
        .expect("Failed to create test superadmin")
}

/// Create a workspace owned by `owner` (owner/admin membership included)
pub async fn create_test_workspace(pool: &PgPool, owner: &UserDBResponse, name: &str) -> WorkspaceDBResponse {
    let mut conn = pool.acquire().await.unwrap();
    crate::workspaces::create_workspace(&mut conn, name, owner.id)
        .await
        .expect("Failed to create test workspace")
}

/// Add a user to a workspace with the given role
pub async fn add_member(pool: &PgPool, workspace_id: WorkspaceId, user_id: UserId, role: WorkspaceRole) {
    let mut conn = pool.acquire().await.unwrap();
    let mut memberships = Memberships::new(&mut conn);
    memberships
        .create(&MembershipCreateDBRequest {
            workspace_id,
            user_id,
            role,
            is_owner: false,
        })
        .await
        .expect("Failed to add test member");
}

/// Build a `WorkspaceContext` the way the guard would, from live rows
pub async fn workspace_context(pool: &PgPool, user: &UserDBResponse, workspace: &WorkspaceDBResponse) -> WorkspaceContext {
    let mut conn = pool.acquire().await.unwrap();
    let mut memberships = Memberships::new(&mut conn);
    let membership = memberships
        .get_by_id((workspace.id, user.id))
        .await
        .unwrap()
        .expect("user has no membership in test workspace");

    WorkspaceContext {
        user: CurrentUser::from(user.clone()),
        workspace: workspace.clone(),
        role: membership.role,
        is_owner: membership.is_owner,
    }
}

/// Session cookie value for a user, as the login handler would set it
pub fn session_cookie_for(user: &UserDBResponse, config: &Config) -> String {
    let current = CurrentUser::from(user.clone());
    let token = crate::auth::session::create_session_token(&current, config).unwrap();
    format!("{}={}", config.auth.native.session.cookie_name, token)
}
