//! Chargebee billing provider (hosted pages + customer portal).
//!
//! Chargebee has no official Rust SDK, so this talks to its REST API v2
//! directly: HTTP Basic auth with the API key as username, form-encoded
//! requests, JSON responses. Webhooks carry no signature; Chargebee instead
//! sends configurable Basic auth credentials, which must be set for webhook
//! processing to be accepted.

use async_trait::async_trait;
use axum::http::HeaderMap;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::{
    billing::{downgrade_by_customer, record_event, upgrade_workspace, BillingError, BillingProvider, Result},
    config::ChargebeeConfig,
    db::models::workspaces::WorkspaceDBResponse,
    types::WorkspaceId,
};

/// Chargebee billing provider
pub struct ChargebeeProvider {
    config: ChargebeeConfig,
    http: reqwest::Client,
}

impl From<ChargebeeConfig> for ChargebeeProvider {
    fn from(config: ChargebeeConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HostedPageEnvelope {
    hosted_page: HostedPage,
}

#[derive(Debug, Deserialize)]
struct HostedPage {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    pass_thru_content: Option<String>,
    #[serde(default)]
    content: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PortalSessionEnvelope {
    portal_session: PortalSession,
}

#[derive(Debug, Deserialize)]
struct PortalSession {
    id: String,
    access_url: String,
}

/// Webhook event body (the fields this application consumes)
#[derive(Debug, Deserialize)]
struct WebhookBody {
    id: String,
    event_type: String,
    #[serde(default)]
    content: serde_json::Value,
}

impl ChargebeeProvider {
    async fn post_form(&self, path: &str, form: &[(String, String)]) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.config.api_base(), path);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.api_key, Some(""))
            .form(form)
            .send()
            .await
            .map_err(|e| BillingError::ProviderApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, %body, "Chargebee API call failed");
            return Err(BillingError::ProviderApi(format!("Chargebee returned {status}")));
        }
        Ok(response)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.config.api_base(), path);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.api_key, Some(""))
            .send()
            .await
            .map_err(|e| BillingError::ProviderApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(BillingError::ProviderApi(format!("Chargebee returned {status}")));
        }
        Ok(response)
    }

    /// Verify the Basic auth credentials Chargebee sends with webhooks.
    /// Unconfigured credentials reject all deliveries.
    fn verify_webhook_auth(&self, headers: &HeaderMap) -> Result<()> {
        let (username, password) = match (&self.config.webhook_username, &self.config.webhook_password) {
            (Some(username), Some(password)) => (username, password),
            _ => {
                return Err(BillingError::WebhookVerification(
                    "Chargebee webhook credentials not configured".to_string(),
                ))
            }
        };

        let header = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| BillingError::WebhookVerification("Missing Authorization header".to_string()))?;

        let encoded = header
            .strip_prefix("Basic ")
            .ok_or_else(|| BillingError::WebhookVerification("Expected Basic authorization".to_string()))?;

        let decoded = general_purpose::STANDARD
            .decode(encoded)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| BillingError::WebhookVerification("Malformed Basic authorization".to_string()))?;

        let expected = format!("{username}:{password}");
        if decoded != expected {
            return Err(BillingError::WebhookVerification("Invalid webhook credentials".to_string()));
        }
        Ok(())
    }

    /// Retrieve a hosted page and, if it succeeded, upgrade the workspace
    /// named in its pass-through content.
    async fn fulfil_hosted_page(&self, db: &PgPool, hosted_page_id: &str) -> Result<Option<WorkspaceId>> {
        let response = self.get(&format!("hosted_pages/{hosted_page_id}")).await?;
        let envelope: HostedPageEnvelope = response.json().await.map_err(|e| BillingError::ProviderApi(e.to_string()))?;
        let hosted_page = envelope.hosted_page;

        if hosted_page.state.as_deref() != Some("succeeded") {
            tracing::warn!(hosted_page = %hosted_page.id, state = ?hosted_page.state, "Checkout not succeeded");
            return Err(BillingError::PaymentNotCompleted);
        }

        let pass_thru: serde_json::Value = hosted_page
            .pass_thru_content
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| BillingError::InvalidData(format!("Malformed pass_thru_content: {e}")))?
            .unwrap_or_else(|| json!({}));

        let workspace_id: WorkspaceId = pass_thru
            .get("workspace_id")
            .and_then(|value| value.as_str())
            .ok_or_else(|| BillingError::InvalidData("Hosted page missing workspace_id".to_string()))?
            .parse()
            .map_err(|_| BillingError::InvalidData("Invalid workspace_id in pass_thru_content".to_string()))?;

        let customer_id = hosted_page
            .content
            .as_ref()
            .and_then(|content| content.get("customer"))
            .and_then(|customer| customer.get("id"))
            .and_then(|id| id.as_str())
            .map(|id| id.to_string());

        upgrade_workspace(db, workspace_id, customer_id.as_deref()).await
    }
}

#[async_trait]
impl BillingProvider for ChargebeeProvider {
    fn name(&self) -> &'static str {
        "chargebee"
    }

    async fn create_checkout_session(&self, workspace: &WorkspaceDBResponse, user_email: &str, dashboard_url: &str) -> Result<String> {
        let pass_thru = json!({ "workspace_id": workspace.id.to_string() }).to_string();
        let form = vec![
            (
                "subscription_items[item_price_id][0]".to_string(),
                self.config.pro_item_price_id.clone(),
            ),
            ("subscription_items[quantity][0]".to_string(), "1".to_string()),
            ("customer[email]".to_string(), user_email.to_string()),
            ("redirect_url".to_string(), format!("{dashboard_url}/billing/success")),
            ("cancel_url".to_string(), format!("{dashboard_url}/dashboard")),
            ("pass_thru_content".to_string(), pass_thru),
        ];

        let response = self.post_form("hosted_pages/checkout_new_for_items", &form).await?;
        let envelope: HostedPageEnvelope = response.json().await.map_err(|e| BillingError::ProviderApi(e.to_string()))?;

        tracing::info!(hosted_page = %envelope.hosted_page.id, workspace_id = %workspace.id, "Created Chargebee checkout");

        envelope
            .hosted_page
            .url
            .ok_or_else(|| BillingError::ProviderApi("Hosted page missing URL".to_string()))
    }

    async fn create_portal_session(&self, billing_customer_id: &str, workspace_id: WorkspaceId, dashboard_url: &str) -> Result<String> {
        let form = vec![
            ("customer[id]".to_string(), billing_customer_id.to_string()),
            (
                "redirect_url".to_string(),
                format!("{dashboard_url}/workspace/{workspace_id}/settings"),
            ),
        ];

        let response = self.post_form("portal_sessions", &form).await?;
        let envelope: PortalSessionEnvelope = response.json().await.map_err(|e| BillingError::ProviderApi(e.to_string()))?;

        tracing::info!(portal_session = %envelope.portal_session.id, %workspace_id, "Created Chargebee portal session");

        // Chargebee calls it access_url; the caller gets the same .url shape
        // as Stripe's portal.
        Ok(envelope.portal_session.access_url)
    }

    async fn handle_successful_checkout(&self, db: &PgPool, session_id: &str) -> Result<Option<WorkspaceId>> {
        self.fulfil_hosted_page(db, session_id).await
    }

    async fn process_webhook(&self, db: &PgPool, headers: &HeaderMap, body: &str) -> Result<()> {
        self.verify_webhook_auth(headers)?;

        let event: WebhookBody =
            serde_json::from_str(body).map_err(|e| BillingError::InvalidData(format!("Malformed webhook body: {e}")))?;

        // Skip duplicate deliveries
        if !record_event(db, self.name(), &event.id, Some(&event.event_type)).await? {
            tracing::debug!(event = %event.id, "Webhook event already processed, skipping");
            return Ok(());
        }

        let customer_id = event
            .content
            .get("customer")
            .and_then(|customer| customer.get("id"))
            .and_then(|id| id.as_str());

        // Upgrades arrive via the redirect flow, not webhooks; only the
        // subscription-ending events matter here.
        match event.event_type.as_str() {
            "subscription_cancelled" => {
                if let Some(customer_id) = customer_id {
                    downgrade_by_customer(db, customer_id, "subscription cancelled").await?;
                }
            }
            "payment_failed" => {
                if let Some(customer_id) = customer_id {
                    downgrade_by_customer(db, customer_id, "payment failed").await?;
                }
            }
            other => {
                tracing::debug!(event_type = %other, "Ignoring webhook event type");
            }
        }

        Ok(())
    }
}
