//! Billing provider abstraction layer.
//!
//! Subscription billing runs entirely on provider-hosted pages: this module
//! mints checkout and customer-portal session URLs, validates completed
//! sessions, and consumes webhooks. Two providers are supported, Stripe and
//! Chargebee, selected by [`crate::config::BillingConfig`].
//!
//! Billing state lives on the workspace record (`plan`,
//! `billing_customer_id`, `upgraded_at`): webhook and checkout fulfilment
//! mutate it here, and the plan gate
//! ([`crate::workspaces::WorkspaceContext::require_pro`]) only ever reads it.

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::Utc;
use sqlx::PgPool;

use crate::{
    api::models::workspaces::Plan,
    config::BillingConfig,
    db::{
        errors::DbError,
        handlers::{BillingEvents, Repository, Workspaces},
        models::billing_events::BillingEventCreateDBRequest,
    },
    db::models::workspaces::WorkspaceDBResponse,
    errors::Error,
    types::WorkspaceId,
};

pub mod chargebee;
pub mod stripe;

/// Create a billing provider from configuration.
///
/// This is the single point where config becomes a provider instance; adding
/// a provider means adding a match arm here.
pub fn create_provider(config: BillingConfig) -> Box<dyn BillingProvider> {
    match config {
        BillingConfig::Stripe(stripe_config) => Box::new(stripe::StripeProvider::from(stripe_config)),
        BillingConfig::Chargebee(chargebee_config) => Box::new(chargebee::ChargebeeProvider::from(chargebee_config)),
    }
}

/// Result type for billing operations
pub type Result<T> = std::result::Result<T, BillingError>;

/// Errors that can occur during billing operations
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("Billing provider API error: {0}")]
    ProviderApi(String),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Payment not completed yet")]
    PaymentNotCompleted,

    #[error("Invalid billing data: {0}")]
    InvalidData(String),

    #[error("Webhook verification failed: {0}")]
    WebhookVerification(String),

    #[error("Billing is not configured: {0}")]
    NotConfigured(String),
}

impl From<sqlx::Error> for BillingError {
    fn from(err: sqlx::Error) -> Self {
        BillingError::Database(DbError::from(err))
    }
}

impl From<BillingError> for Error {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::Database(db) => Error::Database(db),
            BillingError::PaymentNotCompleted => Error::BadRequest {
                message: "Payment has not completed".to_string(),
            },
            BillingError::InvalidData(message) => Error::BadRequest { message },
            BillingError::WebhookVerification(_) => Error::Unauthenticated {
                message: Some("Webhook verification failed".to_string()),
            },
            BillingError::NotConfigured(what) => Error::Internal {
                operation: format!("use billing ({what})"),
            },
            BillingError::ProviderApi(detail) => Error::Internal {
                operation: format!("call billing provider: {detail}"),
            },
        }
    }
}

/// Abstract billing provider interface over hosted pages and webhooks.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Short provider tag used in the webhook event ledger
    fn name(&self) -> &'static str;

    /// Create a hosted checkout session for upgrading a workspace to Pro.
    /// Returns the URL to redirect the admin to.
    async fn create_checkout_session(&self, workspace: &WorkspaceDBResponse, user_email: &str, dashboard_url: &str) -> Result<String>;

    /// Create a customer portal session for subscription self-service.
    /// Returns the URL to redirect the admin to.
    async fn create_portal_session(&self, billing_customer_id: &str, workspace_id: WorkspaceId, dashboard_url: &str) -> Result<String>;

    /// Validate a completed hosted checkout session with the provider and
    /// upgrade the workspace it references. Idempotent: an already-Pro
    /// workspace is left alone. Returns the upgraded workspace's id.
    async fn handle_successful_checkout(&self, db: &PgPool, session_id: &str) -> Result<Option<WorkspaceId>>;

    /// Verify and process one webhook delivery: authenticate it, deduplicate
    /// by event id, and apply upgrade/downgrade effects. Safe to call with
    /// repeated deliveries of the same event.
    async fn process_webhook(&self, db: &PgPool, headers: &HeaderMap, body: &str) -> Result<()>;
}

/// Record a webhook event in the idempotency ledger.
/// Returns `false` when this delivery was already processed.
pub(crate) async fn record_event(db: &PgPool, provider: &'static str, event_id: &str, event_type: Option<&str>) -> Result<bool> {
    let mut conn = db.acquire().await?;
    let mut events = BillingEvents::new(&mut conn);
    let fresh = events
        .record(&BillingEventCreateDBRequest {
            event_id: event_id.to_string(),
            event_type: event_type.map(|s| s.to_string()),
            provider: provider.to_string(),
        })
        .await?;
    Ok(fresh)
}

/// Upgrade a workspace to Pro, attaching the provider's customer id.
/// Idempotent: an already-Pro workspace is returned unchanged.
pub(crate) async fn upgrade_workspace(db: &PgPool, workspace_id: WorkspaceId, billing_customer_id: Option<&str>) -> Result<Option<WorkspaceId>> {
    let mut conn = db.acquire().await?;
    let mut workspaces = Workspaces::new(&mut conn);

    let workspace = match workspaces.get_by_id(workspace_id).await {
        Ok(Some(workspace)) => workspace,
        Ok(None) => {
            tracing::warn!(%workspace_id, "Checkout referenced a workspace that no longer exists");
            return Ok(None);
        }
        Err(e) => return Err(BillingError::Database(e)),
    };

    if workspace.is_pro() {
        return Ok(Some(workspace.id));
    }

    workspaces
        .set_plan(workspace_id, Plan::Pro, billing_customer_id, Some(Utc::now()))
        .await?;
    tracing::info!(%workspace_id, "Upgraded workspace to pro");
    Ok(Some(workspace_id))
}

/// Downgrade the workspace attached to a billing customer back to Free.
/// Used for subscription cancellations and payment failures.
pub(crate) async fn downgrade_by_customer(db: &PgPool, billing_customer_id: &str, reason: &str) -> Result<()> {
    let mut conn = db.acquire().await?;
    let mut workspaces = Workspaces::new(&mut conn);

    let workspace = match workspaces.find_by_billing_customer(billing_customer_id).await? {
        Some(workspace) => workspace,
        None => {
            tracing::warn!(customer = %billing_customer_id, "No workspace for billing customer, ignoring");
            return Ok(());
        }
    };

    if !workspace.is_pro() {
        return Ok(());
    }

    workspaces.set_plan(workspace.id, Plan::Free, None, None).await?;
    tracing::warn!(workspace_id = %workspace.id, reason, "Downgraded workspace to free");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Repository as _;
    use crate::test_utils::{create_test_user, create_test_workspace};
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_upgrade_is_idempotent(pool: PgPool) {
        let user = create_test_user(&pool, "owner@example.com").await;
        let workspace = create_test_workspace(&pool, &user, "Billed").await;

        let upgraded = upgrade_workspace(&pool, workspace.id, Some("cus_123")).await.unwrap();
        assert_eq!(upgraded, Some(workspace.id));

        // Second upgrade leaves the record untouched
        let again = upgrade_workspace(&pool, workspace.id, Some("cus_other")).await.unwrap();
        assert_eq!(again, Some(workspace.id));

        let mut conn = pool.acquire().await.unwrap();
        let mut workspaces = Workspaces::new(&mut conn);
        let reloaded = workspaces.get_by_id(workspace.id).await.unwrap().unwrap();
        assert!(reloaded.is_pro());
        assert_eq!(reloaded.billing_customer_id.as_deref(), Some("cus_123"));
        assert!(reloaded.upgraded_at.is_some());
    }

    #[sqlx::test]
    async fn test_upgrade_missing_workspace_is_a_noop(pool: PgPool) {
        let upgraded = upgrade_workspace(&pool, uuid::Uuid::new_v4(), Some("cus_123")).await.unwrap();
        assert_eq!(upgraded, None);
    }

    #[sqlx::test]
    async fn test_downgrade_by_customer(pool: PgPool) {
        let user = create_test_user(&pool, "owner@example.com").await;
        let workspace = create_test_workspace(&pool, &user, "Billed").await;
        upgrade_workspace(&pool, workspace.id, Some("cus_42")).await.unwrap();

        downgrade_by_customer(&pool, "cus_42", "subscription cancelled").await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let mut workspaces = Workspaces::new(&mut conn);
        let reloaded = workspaces.get_by_id(workspace.id).await.unwrap().unwrap();
        assert!(!reloaded.is_pro());

        // Unknown customers are ignored rather than failing the webhook
        downgrade_by_customer(&pool, "cus_unknown", "payment failed").await.unwrap();
    }

    #[sqlx::test]
    async fn test_record_event_deduplicates(pool: PgPool) {
        assert!(record_event(&pool, "stripe", "evt_1", Some("checkout.session.completed")).await.unwrap());
        assert!(!record_event(&pool, "stripe", "evt_1", Some("checkout.session.completed")).await.unwrap());
        assert!(record_event(&pool, "stripe", "evt_2", None).await.unwrap());
    }
}
