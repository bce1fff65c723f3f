//! Database-layer models.
//!
//! Each entity has a `CreateDBRequest` / `UpdateDBRequest` / `DBResponse`
//! split: requests are what repositories accept, responses are what queries
//! produce (`sqlx::FromRow`). API-facing DTOs live in [`crate::api::models`].

pub mod api_keys;
pub mod billing_events;
pub mod memberships;
pub mod users;
pub mod workspaces;
