//! HTTP request handlers.
//!
//! Handlers are thin: the access guard (an extractor in the signature)
//! resolves the workspace and checks the caller's role before the body runs,
//! repositories do the data access, and DTO conversions happen at the edges.

pub mod api_keys;
pub mod auth;
pub mod billing;
pub mod members;
pub mod users;
pub mod webhooks;
pub mod workspaces;
