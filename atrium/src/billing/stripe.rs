//! Stripe billing provider (hosted checkout + customer portal).

use async_trait::async_trait;
use axum::http::HeaderMap;
use sqlx::PgPool;
use std::collections::HashMap;
use stripe::{
    BillingPortalSession, CheckoutSession, CheckoutSessionMode, CheckoutSessionPaymentStatus, CheckoutSessionStatus, Client,
    CreateBillingPortalSession, CreateCheckoutSession, CreateCheckoutSessionLineItems, EventObject, EventType, Webhook,
};

use crate::{
    billing::{downgrade_by_customer, record_event, upgrade_workspace, BillingError, BillingProvider, Result},
    config::StripeConfig,
    db::models::workspaces::WorkspaceDBResponse,
    types::WorkspaceId,
};

/// Stripe billing provider
pub struct StripeProvider {
    api_key: String,
    pro_price_id: String,
    webhook_secret: String,
}

impl From<StripeConfig> for StripeProvider {
    fn from(config: StripeConfig) -> Self {
        Self {
            api_key: config.secret_key,
            pro_price_id: config.pro_price_id,
            webhook_secret: config.webhook_secret,
        }
    }
}

impl StripeProvider {
    /// Get a Stripe client
    fn client(&self) -> Client {
        Client::new(&self.api_key)
    }

    /// Fetch a checkout session and, if complete and paid, upgrade the
    /// workspace named in its metadata.
    async fn fulfil_checkout(&self, db: &PgPool, session_id: &str) -> Result<Option<WorkspaceId>> {
        let client = self.client();

        let session_id: stripe::CheckoutSessionId = session_id
            .parse()
            .map_err(|_| BillingError::InvalidData("Invalid Stripe session ID".to_string()))?;

        let session = CheckoutSession::retrieve(&client, &session_id, &[]).await.map_err(|e| {
            tracing::error!("Failed to retrieve Stripe checkout session: {:?}", e);
            BillingError::ProviderApi(e.to_string())
        })?;

        if session.status != Some(CheckoutSessionStatus::Complete) {
            tracing::warn!(session = %session_id, status = ?session.status, "Checkout session not complete");
            return Err(BillingError::PaymentNotCompleted);
        }

        if !matches!(
            session.payment_status,
            CheckoutSessionPaymentStatus::Paid | CheckoutSessionPaymentStatus::NoPaymentRequired
        ) {
            tracing::warn!(session = %session_id, payment_status = ?session.payment_status, "Payment not confirmed");
            return Err(BillingError::PaymentNotCompleted);
        }

        let workspace_id: WorkspaceId = session
            .metadata
            .as_ref()
            .and_then(|metadata| metadata.get("workspace_id"))
            .ok_or_else(|| BillingError::InvalidData("Checkout session missing workspace_id metadata".to_string()))?
            .parse()
            .map_err(|_| BillingError::InvalidData("Invalid workspace_id in checkout metadata".to_string()))?;

        let customer_id = session.customer.as_ref().map(|customer| customer.id().to_string());

        upgrade_workspace(db, workspace_id, customer_id.as_deref()).await
    }
}

#[async_trait]
impl BillingProvider for StripeProvider {
    fn name(&self) -> &'static str {
        "stripe"
    }

    async fn create_checkout_session(&self, workspace: &WorkspaceDBResponse, user_email: &str, dashboard_url: &str) -> Result<String> {
        let client = self.client();

        let success_url = format!("{dashboard_url}/billing/success?session_id={{CHECKOUT_SESSION_ID}}");
        let cancel_url = format!("{dashboard_url}/dashboard");
        let mut metadata = HashMap::new();
        metadata.insert("workspace_id".to_string(), workspace.id.to_string());

        let checkout_params = CreateCheckoutSession {
            success_url: Some(&success_url),
            cancel_url: Some(&cancel_url),
            customer_email: Some(user_email),
            mode: Some(CheckoutSessionMode::Subscription),
            line_items: Some(vec![CreateCheckoutSessionLineItems {
                price: Some(self.pro_price_id.clone()),
                quantity: Some(1),
                ..Default::default()
            }]),
            metadata: Some(metadata),
            ..Default::default()
        };

        let session = CheckoutSession::create(&client, checkout_params).await.map_err(|e| {
            tracing::error!("Failed to create Stripe checkout session: {:?}", e);
            BillingError::ProviderApi(e.to_string())
        })?;

        tracing::info!(session = %session.id, workspace_id = %workspace.id, "Created Stripe checkout session");

        session
            .url
            .ok_or_else(|| BillingError::ProviderApi("Checkout session missing URL".to_string()))
    }

    async fn create_portal_session(&self, billing_customer_id: &str, workspace_id: WorkspaceId, dashboard_url: &str) -> Result<String> {
        let client = self.client();

        let customer_id = billing_customer_id
            .parse()
            .map_err(|_| BillingError::InvalidData("Invalid Stripe customer ID".to_string()))?;

        let return_url = format!("{dashboard_url}/workspace/{workspace_id}/settings");
        let mut portal_params = CreateBillingPortalSession::new(customer_id);
        portal_params.return_url = Some(&return_url);

        let session = BillingPortalSession::create(&client, portal_params).await.map_err(|e| {
            tracing::error!("Failed to create Stripe portal session: {:?}", e);
            BillingError::ProviderApi(e.to_string())
        })?;

        tracing::info!(session = %session.id, %workspace_id, "Created Stripe portal session");

        Ok(session.url)
    }

    async fn handle_successful_checkout(&self, db: &PgPool, session_id: &str) -> Result<Option<WorkspaceId>> {
        self.fulfil_checkout(db, session_id).await
    }

    async fn process_webhook(&self, db: &PgPool, headers: &HeaderMap, body: &str) -> Result<()> {
        let signature = headers
            .get("stripe-signature")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| BillingError::WebhookVerification("Missing stripe-signature header".to_string()))?;

        let event = Webhook::construct_event(body, signature, &self.webhook_secret)
            .map_err(|e| BillingError::WebhookVerification(e.to_string()))?;

        // Skip duplicate deliveries
        if !record_event(db, self.name(), event.id.as_str(), Some(&event.type_.to_string())).await? {
            tracing::debug!(event = %event.id, "Webhook event already processed, skipping");
            return Ok(());
        }

        match event.type_ {
            EventType::CheckoutSessionCompleted | EventType::CheckoutSessionAsyncPaymentSucceeded => {
                if let EventObject::CheckoutSession(session) = event.data.object {
                    self.fulfil_checkout(db, session.id.as_str()).await?;
                    tracing::info!(session = %session.id, "Processed checkout completion webhook");
                }
            }
            EventType::CustomerSubscriptionDeleted => {
                if let EventObject::Subscription(subscription) = event.data.object {
                    let customer_id = subscription.customer.id().to_string();
                    downgrade_by_customer(db, &customer_id, "subscription cancelled").await?;
                }
            }
            EventType::InvoicePaymentFailed => {
                if let EventObject::Invoice(invoice) = event.data.object {
                    if let Some(customer) = invoice.customer {
                        downgrade_by_customer(db, &customer.id().to_string(), "payment failed").await?;
                    }
                }
            }
            other => {
                tracing::debug!(event_type = %other, "Ignoring webhook event type");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_provider() -> StripeProvider {
        StripeProvider::from(StripeConfig {
            secret_key: "sk_test_fake".to_string(),
            pro_price_id: "price_fake".to_string(),
            webhook_secret: "whsec_fake".to_string(),
        })
    }

    #[test]
    fn test_provider_from_config() {
        let provider = test_provider();
        assert_eq!(provider.api_key, "sk_test_fake");
        assert_eq!(provider.pro_price_id, "price_fake");
        assert_eq!(provider.name(), "stripe");
    }

    #[sqlx::test]
    async fn test_webhook_rejects_missing_signature(pool: sqlx::PgPool) {
        let provider = test_provider();
        let err = provider.process_webhook(&pool, &HeaderMap::new(), "{}").await.unwrap_err();
        assert!(matches!(err, BillingError::WebhookVerification(_)));
    }

    #[sqlx::test]
    async fn test_webhook_rejects_bad_signature(pool: sqlx::PgPool) {
        let provider = test_provider();
        let mut headers = HeaderMap::new();
        headers.insert("stripe-signature", "t=123,v1=deadbeef".parse().unwrap());

        let err = provider
            .process_webhook(&pool, &headers, r#"{"id":"evt_1","type":"checkout.session.completed"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::WebhookVerification(_)));
    }
}
