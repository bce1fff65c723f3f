//! Database repository for the billing webhook idempotency ledger.

use crate::db::{
    errors::{DbError, Result},
    models::billing_events::{BillingEventCreateDBRequest, BillingEventDBResponse},
};
use sqlx::PgConnection;
use tracing::instrument;

pub struct BillingEvents<'c> {
    db: &'c mut PgConnection,
}

impl<'c> BillingEvents<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Record a webhook delivery. Returns `false` when the event id was
    /// already recorded, which callers treat as "skip, already processed".
    #[instrument(skip(self, request), fields(event_id = %request.event_id, provider = %request.provider), err)]
    pub async fn record(&mut self, request: &BillingEventCreateDBRequest) -> Result<bool> {
        match sqlx::query_as::<_, BillingEventDBResponse>(
            r#"
            INSERT INTO billing_events (event_id, event_type, provider)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&request.event_id)
        .bind(&request.event_type)
        .bind(&request.provider)
        .fetch_one(&mut *self.db)
        .await
        {
            Ok(_) => Ok(true),
            Err(e) => match DbError::from(e) {
                DbError::UniqueViolation { .. } => Ok(false),
                other => Err(other),
            },
        }
    }
}
