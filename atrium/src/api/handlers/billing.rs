//! Billing handlers: hosted checkout, customer portal, checkout success.

use crate::api::models::users::CurrentUser;
use crate::api::models::workspaces::HostedPageResponse;
use crate::errors::{Error, Result};
use crate::types::WorkspaceId;
use crate::workspaces::guard::{role, WorkspaceScope};
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Query parameters for the checkout success redirect.
/// Stripe sends `session_id`, Chargebee sends `id`.
#[derive(Debug, Deserialize)]
pub struct BillingSuccessQuery {
    pub session_id: Option<String>,
    pub id: Option<String>,
}

/// Result of validating a completed checkout
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BillingSuccessResponse {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub workspace_id: Option<WorkspaceId>,
    pub upgraded: bool,
}

#[utoipa::path(
    post,
    path = "/workspaces/{workspace_id}/billing/checkout",
    tag = "billing",
    summary = "Start a hosted checkout to upgrade the workspace (admin only)",
    params(("workspace_id" = uuid::Uuid, Path, description = "Workspace ID")),
    responses(
        (status = 200, description = "Hosted page to redirect to", body = HostedPageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Insufficient role"),
        (status = 409, description = "Workspace already on Pro with no billing record")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_checkout(State(state): State<AppState>, scope: WorkspaceScope<role::Admin>) -> Result<Json<HostedPageResponse>> {
    let provider = state.billing_provider()?;

    // Prevent duplicate subscriptions: an already-Pro workspace goes to the
    // portal for subscription management instead of a second checkout.
    if scope.workspace.is_pro() {
        return match scope.workspace.billing_customer_id.as_deref() {
            Some(customer_id) => {
                let url = provider
                    .create_portal_session(customer_id, scope.workspace_id(), &state.config.dashboard_url)
                    .await?;
                Ok(Json(HostedPageResponse { url }))
            }
            None => Err(Error::Conflict {
                message: "Workspace is already on the Pro plan".to_string(),
            }),
        };
    }

    let url = provider
        .create_checkout_session(&scope.workspace, &scope.user.email, &state.config.dashboard_url)
        .await?;

    Ok(Json(HostedPageResponse { url }))
}

#[utoipa::path(
    post,
    path = "/workspaces/{workspace_id}/billing/portal",
    tag = "billing",
    summary = "Open the billing provider's customer portal (admin only)",
    params(("workspace_id" = uuid::Uuid, Path, description = "Workspace ID")),
    responses(
        (status = 200, description = "Portal page to redirect to", body = HostedPageResponse),
        (status = 400, description = "Workspace has no billing record"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Insufficient role")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_portal(State(state): State<AppState>, scope: WorkspaceScope<role::Admin>) -> Result<Json<HostedPageResponse>> {
    let provider = state.billing_provider()?;

    let customer_id = scope.workspace.billing_customer_id.as_deref().ok_or_else(|| Error::BadRequest {
        message: "Workspace has no billing record yet; upgrade first".to_string(),
    })?;

    let url = provider
        .create_portal_session(customer_id, scope.workspace_id(), &state.config.dashboard_url)
        .await?;

    Ok(Json(HostedPageResponse { url }))
}

#[utoipa::path(
    get,
    path = "/billing/success",
    tag = "billing",
    summary = "Validate a completed checkout and upgrade the workspace",
    responses(
        (status = 200, description = "Checkout validated", body = BillingSuccessResponse),
        (status = 400, description = "Missing or unpaid session"),
        (status = 401, description = "Unauthorized")
    ),
    security(("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn billing_success(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<BillingSuccessQuery>,
) -> Result<Json<BillingSuccessResponse>> {
    let provider = state.billing_provider()?;

    // Stripe uses ?session_id=, Chargebee uses ?id=
    let session_id = query.session_id.or(query.id).ok_or_else(|| Error::BadRequest {
        message: "Missing checkout session id".to_string(),
    })?;

    let workspace_id = provider.handle_successful_checkout(&state.db, &session_id).await?;

    Ok(Json(BillingSuccessResponse {
        upgraded: workspace_id.is_some(),
        workspace_id,
    }))
}
