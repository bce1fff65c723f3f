//! OpenAPI documentation for the management API.

use utoipa::OpenApi;

use crate::api::handlers;
use crate::api::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Atrium API",
        description = "Multi-tenant SaaS starter: authentication, workspaces, team roles, and hosted-page billing"
    ),
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::change_password,
        handlers::users::get_profile,
        handlers::users::update_profile,
        handlers::users::list_users,
        handlers::users::platform_stats,
        handlers::workspaces::list_workspaces,
        handlers::workspaces::create_workspace,
        handlers::workspaces::get_workspace,
        handlers::workspaces::get_current_workspace,
        handlers::workspaces::update_workspace,
        handlers::workspaces::delete_workspace,
        handlers::workspaces::switch_workspace,
        handlers::members::list_members,
        handlers::members::add_member,
        handlers::members::update_member,
        handlers::members::remove_member,
        handlers::api_keys::list_api_keys,
        handlers::api_keys::create_api_key,
        handlers::api_keys::revoke_api_key,
        handlers::billing::create_checkout,
        handlers::billing::create_portal,
        handlers::billing::billing_success,
        handlers::webhooks::billing_webhook,
    ),
    components(schemas(
        models::users::RegisterRequest,
        models::users::LoginRequest,
        models::users::PasswordChangeRequest,
        models::users::ProfileUpdate,
        models::users::UserResponse,
        models::users::CurrentUser,
        models::users::PlatformStats,
        models::workspaces::Plan,
        models::workspaces::WorkspaceCreate,
        models::workspaces::WorkspaceUpdate,
        models::workspaces::WorkspaceResponse,
        models::workspaces::HostedPageResponse,
        models::members::WorkspaceRole,
        models::members::MemberAdd,
        models::members::MemberRoleUpdate,
        models::members::MemberResponse,
        models::api_keys::ApiKeyCreate,
        models::api_keys::ApiKeyResponse,
        models::api_keys::ApiKeyCreated,
        handlers::billing::BillingSuccessResponse,
    )),
    tags(
        (name = "authentication", description = "Registration, login, and session management"),
        (name = "users", description = "Profiles and platform administration"),
        (name = "workspaces", description = "Workspace lifecycle and switching"),
        (name = "members", description = "Workspace membership and roles"),
        (name = "api-keys", description = "Workspace-scoped API keys"),
        (name = "billing", description = "Hosted checkout and customer portal"),
        (name = "webhooks", description = "Billing provider webhooks"),
    )
)]
pub struct ApiDoc;
