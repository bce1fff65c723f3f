//! # atrium: a multi-tenant SaaS starter
//!
//! `atrium` is a web application scaffold providing authentication, workspace
//! isolation, team roles, and subscription billing via hosted checkout pages
//! (Stripe or Chargebee). It is meant to be forked: the substantive machinery
//! is the workspace access-scoping and role-authorization layer, and feature
//! code is added as handlers behind it.
//!
//! ## Overview
//!
//! A workspace is the tenant boundary. Users hold memberships in workspaces
//! with a role (`member < admin`), the workspace creator is the protected
//! owner, and every piece of tenant-owned business data carries exactly one
//! `workspace_id` foreign key.
//!
//! ### Request Flow
//!
//! An inbound request to a workspace route passes through the access guard
//! ([`workspaces::guard::WorkspaceScope`]) before the handler body runs. The
//! guard authenticates the caller ([`auth::current_user`]), resolves the
//! current workspace from the route's `workspace_id` parameter or the
//! caller's remembered workspace ([`workspaces::resolver`]), compares the
//! membership role against the handler's declared requirement, and publishes
//! the request-scoped [`workspaces::WorkspaceContext`]. Handlers then reach
//! workspace-owned data exclusively through
//! [`workspaces::scoped::ScopedQuery`], which pins every query to the
//! resolved workspace.
//!
//! Billing state lives on the workspace record (`plan`, `billing_customer_id`,
//! `upgraded_at`). The [`billing`] layer mints hosted checkout and customer
//! portal session URLs and consumes provider webhooks; the plan gate
//! ([`workspaces::WorkspaceContext::require_pro`]) only reads `plan`.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses PostgreSQL (via sqlx) for all persistence. The
//! **API layer** ([`api`]) exposes the management API at `/admin/api/v1/*`
//! and authentication routes at `/authentication/*`; the **database layer**
//! ([`db`]) uses the repository pattern; the **workspace core**
//! ([`workspaces`]) owns resolution, guarding, scoping, and membership
//! transitions.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use atrium::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = atrium::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     atrium::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod billing;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
pub mod types;
pub mod workspaces;

#[cfg(test)]
pub mod test_utils;

use crate::auth::password;
use crate::billing::BillingProvider;
use crate::config::CorsOrigin;
use crate::db::handlers::{Repository as _, Users};
use crate::db::models::users::UserCreateDBRequest;
use crate::errors::Error;
use crate::openapi::ApiDoc;
use axum::http::HeaderValue;
use axum::{
    http,
    routing::{delete, get, post},
    Router,
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument, Level};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

pub use types::{ApiKeyId, UserId, WorkspaceId};

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `db`: PostgreSQL connection pool
/// - `config`: Application configuration loaded from file/environment
/// - `billing`: The configured billing provider, if any
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub billing: Option<Arc<dyn BillingProvider>>,
}

impl AppState {
    /// The configured billing provider, or an error for deployments without
    /// billing set up.
    pub fn billing_provider(&self) -> crate::errors::Result<&dyn BillingProvider> {
        self.billing.as_deref().ok_or_else(|| Error::Internal {
            operation: "use billing (no provider configured)".to_string(),
        })
    }
}

/// Get the atrium database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial superadmin user if it doesn't exist.
///
/// Idempotent: creates the user (with a personal workspace) on first startup,
/// updates the password on subsequent startups when one is configured.
/// Returns the superadmin's user ID.
#[instrument(skip_all)]
pub async fn create_initial_superadmin(email: &str, password: Option<&str>, db: &PgPool) -> crate::errors::Result<UserId> {
    let password_hash = password.map(password::hash_string).transpose()?;

    let mut tx = db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing) = user_repo.get_user_by_email(email).await? {
        if let Some(password_hash) = password_hash {
            user_repo
                .update(
                    existing.id,
                    &crate::db::models::users::UserUpdateDBRequest {
                        password_hash: Some(password_hash),
                        ..Default::default()
                    },
                )
                .await?;
        }
        tx.commit().await.map_err(|e| Error::Database(e.into()))?;
        return Ok(existing.id);
    }

    let user = user_repo
        .create(&UserCreateDBRequest {
            username: email.to_string(),
            email: email.to_string(),
            display_name: None,
            password_hash,
            is_superadmin: true,
            auth_source: "system".to_string(),
        })
        .await?;

    workspaces::provision_personal_workspace(&mut tx, &user).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    info!(user_id = %user.id, "Created initial superadmin");
    Ok(user.id)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// This constructs the complete Axum router with:
/// - Authentication routes (registration, login, logout, password change)
/// - Management API routes under `/admin/api/v1`
/// - The billing webhook route
/// - API docs, CORS, and tracing middleware
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    // Authentication routes (at root level, can be masked when deployed
    // behind an SSO proxy)
    let auth_routes = Router::new()
        .route("/authentication/register", post(api::handlers::auth::register))
        .route("/authentication/login", post(api::handlers::auth::login))
        .route("/authentication/logout", post(api::handlers::auth::logout))
        .route("/authentication/password-change", post(api::handlers::auth::change_password))
        .with_state(state.clone());

    // Management API routes
    let api_routes = Router::new()
        // Profile and platform administration
        .route(
            "/users/me",
            get(api::handlers::users::get_profile).patch(api::handlers::users::update_profile),
        )
        .route("/users", get(api::handlers::users::list_users))
        .route("/stats", get(api::handlers::users::platform_stats))
        // Workspaces
        .route(
            "/workspaces",
            get(api::handlers::workspaces::list_workspaces).post(api::handlers::workspaces::create_workspace),
        )
        .route("/workspaces/current", get(api::handlers::workspaces::get_current_workspace))
        .route(
            "/workspaces/{workspace_id}",
            get(api::handlers::workspaces::get_workspace)
                .patch(api::handlers::workspaces::update_workspace)
                .delete(api::handlers::workspaces::delete_workspace),
        )
        .route("/workspaces/{workspace_id}/switch", post(api::handlers::workspaces::switch_workspace))
        // Members
        .route(
            "/workspaces/{workspace_id}/members",
            get(api::handlers::members::list_members).post(api::handlers::members::add_member),
        )
        .route(
            "/workspaces/{workspace_id}/members/{user_id}",
            axum::routing::patch(api::handlers::members::update_member).delete(api::handlers::members::remove_member),
        )
        // Workspace API keys
        .route(
            "/workspaces/{workspace_id}/api-keys",
            get(api::handlers::api_keys::list_api_keys).post(api::handlers::api_keys::create_api_key),
        )
        .route(
            "/workspaces/{workspace_id}/api-keys/{key_id}",
            delete(api::handlers::api_keys::revoke_api_key),
        )
        // Billing
        .route(
            "/workspaces/{workspace_id}/billing/checkout",
            post(api::handlers::billing::create_checkout),
        )
        .route("/workspaces/{workspace_id}/billing/portal", post(api::handlers::billing::create_portal))
        .route("/billing/success", get(api::handlers::billing::billing_success))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        // Webhook routes (external services, not session-authenticated)
        .route("/webhooks/billing", post(api::handlers::webhooks::billing_webhook))
        .with_state(state.clone())
        .merge(auth_routes)
        .nest("/admin/api/v1", api_routes)
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/admin/docs"));

    // CORS + tracing
    let cors_layer = create_cors_layer(&state.config)?;
    let router = router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] connects to the database, runs
///    migrations, bootstraps the superadmin, and builds the router
/// 2. **Serve**: [`Application::serve`] binds the TCP listener and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = PgPool::connect(&config.database_url).await?;
        migrator().run(&pool).await?;

        create_initial_superadmin(&config.admin_email, config.admin_password.as_deref(), &pool)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create initial superadmin: {e}"))?;

        let billing = config.billing.clone().map(|billing_config| {
            let provider: Arc<dyn BillingProvider> = billing::create_provider(billing_config).into();
            provider
        });

        let state = AppState::builder().db(pool.clone()).config(config.clone()).maybe_billing(billing).build();
        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Atrium listening on http://{bind_addr}");

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::api::models::members::WorkspaceRole;
    use crate::test_utils::*;
    use serde_json::json;
    use sqlx::PgPool;

    /// Signup provisions a personal workspace and logs the user in.
    #[sqlx::test]
    #[test_log::test]
    async fn test_signup_provisions_workspace_and_session(pool: PgPool) {
        let server = create_test_server(pool.clone(), create_test_config()).await;

        let response = server
            .post("/authentication/register")
            .json(&json!({ "email": "jane@example.com", "password": "password123!" }))
            .await;
        assert_eq!(response.status_code().as_u16(), 201);
        assert!(response.headers().get("set-cookie").is_some());

        let cookie = response
            .headers()
            .get("set-cookie")
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();

        let workspaces = server
            .get("/admin/api/v1/workspaces")
            .add_header("cookie", &cookie)
            .await;
        assert_eq!(workspaces.status_code().as_u16(), 200);
        let list: Vec<serde_json::Value> = workspaces.json();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["role"], "admin");

        // The personal workspace resolves implicitly as the current one
        let current = server
            .get("/admin/api/v1/workspaces/current")
            .add_header("cookie", &cookie)
            .await;
        assert_eq!(current.status_code().as_u16(), 200);
    }

    /// The full team scenario: owner adds a member, the member's admin-only
    /// action is forbidden until promotion, and the owner stays protected.
    #[sqlx::test]
    #[test_log::test]
    async fn test_team_role_scenario(pool: PgPool) {
        let config = create_test_config();
        let server = create_test_server(pool.clone(), config.clone()).await;

        // A creates workspace W (A becomes owner/admin)
        let user_a = create_test_user(&pool, "a@example.com").await;
        let workspace = create_test_workspace(&pool, &user_a, "Team W").await;
        let cookie_a = session_cookie_for(&user_a, &config);

        // A adds B as member
        let user_b = create_test_user(&pool, "b@example.com").await;
        let added = server
            .post(&format!("/admin/api/v1/workspaces/{}/members", workspace.id))
            .add_header("cookie", &cookie_a)
            .json(&json!({ "email": "b@example.com" }))
            .await;
        assert_eq!(added.status_code().as_u16(), 201);
        assert_eq!(added.json::<serde_json::Value>()["role"], "member");

        // B attempts an admin-only action -> Forbidden
        let cookie_b = session_cookie_for(&user_b, &config);
        let forbidden = server
            .patch(&format!("/admin/api/v1/workspaces/{}", workspace.id))
            .add_header("cookie", &cookie_b)
            .json(&json!({ "name": "Renamed by B" }))
            .await;
        assert_eq!(forbidden.status_code().as_u16(), 403);

        // A promotes B to admin
        let promoted = server
            .patch(&format!("/admin/api/v1/workspaces/{}/members/{}", workspace.id, user_b.id))
            .add_header("cookie", &cookie_a)
            .json(&json!({ "role": "admin" }))
            .await;
        assert_eq!(promoted.status_code().as_u16(), 200);

        // B retries the same action -> succeeds
        let allowed = server
            .patch(&format!("/admin/api/v1/workspaces/{}", workspace.id))
            .add_header("cookie", &cookie_b)
            .json(&json!({ "name": "Renamed by B" }))
            .await;
        assert_eq!(allowed.status_code().as_u16(), 200);

        // A attempts to remove self as owner -> owner protection wins
        let owner_protected = server
            .delete(&format!("/admin/api/v1/workspaces/{}/members/{}", workspace.id, user_a.id))
            .add_header("cookie", &cookie_a)
            .await;
        assert_eq!(owner_protected.status_code().as_u16(), 403);

        // B (another admin) also cannot demote or remove the owner
        let demote_owner = server
            .patch(&format!("/admin/api/v1/workspaces/{}/members/{}", workspace.id, user_a.id))
            .add_header("cookie", &cookie_b)
            .json(&json!({ "role": "member" }))
            .await;
        assert_eq!(demote_owner.status_code().as_u16(), 403);
    }

    /// A user with no membership sees 404 for the workspace, not 403 - the
    /// existence of other tenants' workspaces must not leak.
    #[sqlx::test]
    #[test_log::test]
    async fn test_foreign_workspace_is_not_found(pool: PgPool) {
        let config = create_test_config();
        let server = create_test_server(pool.clone(), config.clone()).await;

        let owner = create_test_user(&pool, "owner@example.com").await;
        let outsider = create_test_user(&pool, "c@example.com").await;
        let workspace = create_test_workspace(&pool, &owner, "Private").await;

        let cookie_c = session_cookie_for(&outsider, &config);
        let response = server
            .get(&format!("/admin/api/v1/workspaces/{}", workspace.id))
            .add_header("cookie", &cookie_c)
            .await;
        assert_eq!(response.status_code().as_u16(), 404);

        // Same status for a workspace that does not exist at all
        let missing = server
            .get(&format!("/admin/api/v1/workspaces/{}", uuid::Uuid::new_v4()))
            .add_header("cookie", &cookie_c)
            .await;
        assert_eq!(missing.status_code().as_u16(), 404);
    }

    /// Several workspaces and no remembered one: implicit resolution reports
    /// selection-required; an explicit switch then pins the current one.
    #[sqlx::test]
    #[test_log::test]
    async fn test_workspace_selection_and_switch(pool: PgPool) {
        let config = create_test_config();
        let server = create_test_server(pool.clone(), config.clone()).await;

        let user = create_test_user(&pool, "multi@example.com").await;
        let first = create_test_workspace(&pool, &user, "First").await;
        let second = create_test_workspace(&pool, &user, "Second").await;
        let cookie = session_cookie_for(&user, &config);

        let ambiguous = server
            .get("/admin/api/v1/workspaces/current")
            .add_header("cookie", &cookie)
            .await;
        assert_eq!(ambiguous.status_code().as_u16(), 409);
        assert_eq!(ambiguous.json::<serde_json::Value>()["error"], "workspace_selection_required");

        let switched = server
            .post(&format!("/admin/api/v1/workspaces/{}/switch", first.id))
            .add_header("cookie", &cookie)
            .await;
        assert_eq!(switched.status_code().as_u16(), 200);

        let current = server
            .get("/admin/api/v1/workspaces/current")
            .add_header("cookie", &cookie)
            .await;
        assert_eq!(current.status_code().as_u16(), 200);
        assert_eq!(current.json::<serde_json::Value>()["id"], json!(first.id));

        // Visiting the other workspace explicitly re-pins the remembered one
        server
            .get(&format!("/admin/api/v1/workspaces/{}", second.id))
            .add_header("cookie", &cookie)
            .await
            .assert_status_ok();
        let current = server
            .get("/admin/api/v1/workspaces/current")
            .add_header("cookie", &cookie)
            .await;
        assert_eq!(current.json::<serde_json::Value>()["id"], json!(second.id));
    }

    /// API keys are only reachable within their own workspace.
    #[sqlx::test]
    #[test_log::test]
    async fn test_api_keys_are_tenant_isolated(pool: PgPool) {
        let config = create_test_config();
        let server = create_test_server(pool.clone(), config.clone()).await;

        let alice = create_test_user(&pool, "alice@example.com").await;
        let bob = create_test_user(&pool, "bob@example.com").await;
        let ws_a = create_test_workspace(&pool, &alice, "A").await;
        let ws_b = create_test_workspace(&pool, &bob, "B").await;
        let cookie_a = session_cookie_for(&alice, &config);
        let cookie_b = session_cookie_for(&bob, &config);

        let created = server
            .post(&format!("/admin/api/v1/workspaces/{}/api-keys", ws_a.id))
            .add_header("cookie", &cookie_a)
            .json(&json!({ "name": "ci" }))
            .await;
        assert_eq!(created.status_code().as_u16(), 201);
        let created: serde_json::Value = created.json();
        assert!(created["key"].as_str().unwrap().starts_with("ak_"));
        let key_id = created["id"].as_str().unwrap();

        // Bob cannot revoke Alice's key through his own workspace
        let foreign_revoke = server
            .delete(&format!("/admin/api/v1/workspaces/{}/api-keys/{}", ws_b.id, key_id))
            .add_header("cookie", &cookie_b)
            .await;
        assert_eq!(foreign_revoke.status_code().as_u16(), 404);

        // And he holds no membership in Alice's workspace at all
        let no_access = server
            .delete(&format!("/admin/api/v1/workspaces/{}/api-keys/{}", ws_a.id, key_id))
            .add_header("cookie", &cookie_b)
            .await;
        assert_eq!(no_access.status_code().as_u16(), 404);

        // Alice revokes it for real
        let revoked = server
            .delete(&format!("/admin/api/v1/workspaces/{}/api-keys/{}", ws_a.id, key_id))
            .add_header("cookie", &cookie_a)
            .await;
        assert_eq!(revoked.status_code().as_u16(), 204);

        let listed = server
            .get(&format!("/admin/api/v1/workspaces/{}/api-keys", ws_a.id))
            .add_header("cookie", &cookie_a)
            .await;
        let keys: Vec<serde_json::Value> = listed.json();
        assert!(keys.is_empty());
    }

    /// Members can read but not mint or revoke API keys.
    #[sqlx::test]
    #[test_log::test]
    async fn test_member_cannot_manage_api_keys(pool: PgPool) {
        let config = create_test_config();
        let server = create_test_server(pool.clone(), config.clone()).await;

        let owner = create_test_user(&pool, "owner@example.com").await;
        let member = create_test_user(&pool, "member@example.com").await;
        let workspace = create_test_workspace(&pool, &owner, "Keys").await;
        add_member(&pool, workspace.id, member.id, WorkspaceRole::Member).await;

        let cookie = session_cookie_for(&member, &config);
        let list = server
            .get(&format!("/admin/api/v1/workspaces/{}/api-keys", workspace.id))
            .add_header("cookie", &cookie)
            .await;
        assert_eq!(list.status_code().as_u16(), 200);

        let create = server
            .post(&format!("/admin/api/v1/workspaces/{}/api-keys", workspace.id))
            .add_header("cookie", &cookie)
            .json(&json!({ "name": "nope" }))
            .await;
        assert_eq!(create.status_code().as_u16(), 403);
    }

    /// Unauthenticated requests get 401, not 403 or 404.
    #[sqlx::test]
    #[test_log::test]
    async fn test_unauthenticated_is_401(pool: PgPool) {
        let server = create_test_server(pool.clone(), create_test_config()).await;

        let response = server.get("/admin/api/v1/workspaces/current").await;
        assert_eq!(response.status_code().as_u16(), 401);
    }

    /// Superadmin-only endpoints reject regular users.
    #[sqlx::test]
    #[test_log::test]
    async fn test_platform_endpoints_require_superadmin(pool: PgPool) {
        let config = create_test_config();
        let server = create_test_server(pool.clone(), config.clone()).await;

        let user = create_test_user(&pool, "user@example.com").await;
        let admin = create_test_superadmin(&pool, "root@example.com").await;

        let cookie_user = session_cookie_for(&user, &config);
        let denied = server.get("/admin/api/v1/stats").add_header("cookie", &cookie_user).await;
        assert_eq!(denied.status_code().as_u16(), 403);

        let cookie_admin = session_cookie_for(&admin, &config);
        let stats = server.get("/admin/api/v1/stats").add_header("cookie", &cookie_admin).await;
        assert_eq!(stats.status_code().as_u16(), 200);
        let stats: serde_json::Value = stats.json();
        assert_eq!(stats["total_users"], 2);
    }

    /// Login round-trip with the real password hash.
    #[sqlx::test]
    #[test_log::test]
    async fn test_login_and_password_change(pool: PgPool) {
        let config = create_test_config();
        let server = create_test_server(pool.clone(), config.clone()).await;
        let user = create_test_user(&pool, "login@example.com").await;

        let bad = server
            .post("/authentication/login")
            .json(&json!({ "email": user.email, "password": "wrong" }))
            .await;
        assert_eq!(bad.status_code().as_u16(), 401);

        let good = server
            .post("/authentication/login")
            .json(&json!({ "email": user.email, "password": "password123!" }))
            .await;
        assert_eq!(good.status_code().as_u16(), 200);
        let cookie = good
            .headers()
            .get("set-cookie")
            .unwrap()
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();

        let changed = server
            .post("/authentication/password-change")
            .add_header("cookie", &cookie)
            .json(&json!({ "current_password": "password123!", "new_password": "evenbetter456!" }))
            .await;
        assert_eq!(changed.status_code().as_u16(), 204);

        let relogin = server
            .post("/authentication/login")
            .json(&json!({ "email": user.email, "password": "evenbetter456!" }))
            .await;
        assert_eq!(relogin.status_code().as_u16(), 200);
    }

    /// Owner-only workspace deletion cascades memberships and keys.
    #[sqlx::test]
    #[test_log::test]
    async fn test_workspace_deletion_is_owner_only(pool: PgPool) {
        let config = create_test_config();
        let server = create_test_server(pool.clone(), config.clone()).await;

        let owner = create_test_user(&pool, "owner@example.com").await;
        let admin = create_test_user(&pool, "admin@example.com").await;
        let workspace = create_test_workspace(&pool, &owner, "Doomed").await;
        add_member(&pool, workspace.id, admin.id, WorkspaceRole::Admin).await;

        // A non-owner admin cannot delete
        let cookie_admin = session_cookie_for(&admin, &config);
        let denied = server
            .delete(&format!("/admin/api/v1/workspaces/{}", workspace.id))
            .add_header("cookie", &cookie_admin)
            .await;
        assert_eq!(denied.status_code().as_u16(), 403);

        let cookie_owner = session_cookie_for(&owner, &config);
        let deleted = server
            .delete(&format!("/admin/api/v1/workspaces/{}", workspace.id))
            .add_header("cookie", &cookie_owner)
            .await;
        assert_eq!(deleted.status_code().as_u16(), 204);

        // Memberships went with it
        let mut conn = pool.acquire().await.unwrap();
        let mut memberships = crate::db::handlers::Memberships::new(&mut conn);
        assert_eq!(memberships.count_members(workspace.id).await.unwrap(), 0);
    }
}
