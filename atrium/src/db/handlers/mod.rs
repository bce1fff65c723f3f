//! Repository implementations for database access.
//!
//! This module provides repository structs for each major entity in the system.
//! Repositories follow a consistent pattern and implement the [`Repository`] trait.
//!
//! # Design Pattern
//!
//! Each repository:
//! - Wraps a SQLx connection or transaction
//! - Provides strongly-typed CRUD operations
//! - Handles query construction and parameter binding
//! - Returns domain models from [`crate::db::models`]
//! - Uses the connection's transaction for ACID guarantees
//!
//! # Available Repositories
//!
//! - [`Users`]: User account management and authentication lookups
//! - [`Workspaces`]: Workspace (tenant) records and billing plan flags
//! - [`Memberships`]: The (user, workspace, role) join entity
//! - [`ApiKeys`]: Workspace-scoped API key issuance and revocation
//! - [`BillingEvents`]: Processed webhook event ledger (idempotency)
//!
//! # Common Pattern
//!
//! All repositories follow this usage pattern:
//!
//! ```ignore
//! use atrium::db::handlers::{Users, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     // Start a transaction
//!     let mut tx = pool.begin().await?;
//!
//!     // Create repository from transaction
//!     let mut repo = Users::new(&mut tx);
//!
//!     // Perform operations
//!     let user = repo.get_user_by_email("someone@example.com").await?;
//!
//!     // Commit or rollback
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod api_keys;
pub mod billing_events;
pub mod memberships;
pub mod repository;
pub mod users;
pub mod workspaces;

pub use api_keys::ApiKeys;
pub use billing_events::BillingEvents;
pub use memberships::Memberships;
pub use repository::Repository;
pub use users::Users;
pub use workspaces::Workspaces;
