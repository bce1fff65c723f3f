//! Billing webhook handler.
//!
//! A single route serves whichever provider is configured; the provider
//! implementation authenticates the delivery (Stripe signature, Chargebee
//! Basic auth), deduplicates it against the event ledger, and applies the
//! plan changes.

use crate::errors::Result;
use crate::AppState;
use axum::{extract::State, http::HeaderMap};

#[utoipa::path(
    post,
    path = "/webhooks/billing",
    tag = "webhooks",
    summary = "Billing provider webhook endpoint",
    responses(
        (status = 200, description = "Event processed (or already processed)"),
        (status = 400, description = "Malformed event"),
        (status = 401, description = "Verification failed")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn billing_webhook(State(state): State<AppState>, headers: HeaderMap, body: String) -> Result<&'static str> {
    let provider = state.billing_provider()?;
    provider.process_webhook(&state.db, &headers, &body).await?;
    Ok("OK")
}
