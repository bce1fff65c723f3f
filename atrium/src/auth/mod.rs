//! Authentication for the management API.
//!
//! # Authentication Methods
//!
//! ## 1. Session Authentication
//!
//! Browser-based authentication using secure HTTP-only cookies:
//! - Users log in via `/authentication/login` with email/password
//! - A signed JWT session token is stored in an HTTP-only cookie
//! - Tokens expire after `auth.security.jwt_expiry`
//!
//! ## 2. Trusted Proxy Header
//!
//! When deployed behind an authenticating reverse proxy (SSO), the proxy
//! asserts the user's email in a request header. Unknown users can be
//! auto-provisioned with a personal workspace on first sight.
//!
//! # Authorization
//!
//! Authorization is workspace-scoped and handled by
//! [`crate::workspaces::guard`]; this module only establishes *who* is
//! calling. The one platform-level check here is
//! [`current_user::require_superadmin`].
//!
//! # Modules
//!
//! - [`current_user`]: The `CurrentUser` extractor
//! - [`session`]: JWT session token creation/verification and cookie helpers
//! - [`password`]: Password hashing and verification using Argon2
//! - [`api_keys`]: Workspace API key generation and hashing

pub mod api_keys;
pub mod current_user;
pub mod password;
pub mod session;
