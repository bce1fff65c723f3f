//! Database models for processed billing webhook events.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database request for recording a webhook event
#[derive(Debug, Clone)]
pub struct BillingEventCreateDBRequest {
    /// Provider-assigned event id; unique, used for delivery deduplication
    pub event_id: String,
    pub event_type: Option<String>,
    /// "stripe" or "chargebee"
    pub provider: String,
}

/// Database response for a recorded webhook event
#[derive(Debug, Clone, FromRow)]
pub struct BillingEventDBResponse {
    pub id: Uuid,
    pub event_id: String,
    pub event_type: Option<String>,
    pub provider: String,
    pub created_at: DateTime<Utc>,
}
