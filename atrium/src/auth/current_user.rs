//! The `CurrentUser` extractor: authentication for the management API.
//!
//! Authentication methods are tried in priority order:
//!
//! 1. JWT session cookie (native auth, when enabled)
//! 2. Trusted reverse-proxy header (SSO integration, when enabled)
//!
//! Each method reports `None` (not applicable), `Some(Ok(user))`, or
//! `Some(Err(_))` (credentials present but invalid); the extractor returns the
//! first success and falls through otherwise.

use crate::{
    api::models::users::CurrentUser,
    auth::session,
    db::{
        errors::DbError,
        handlers::Users,
        models::users::UserCreateDBRequest,
    },
    errors::{Error, Result},
    workspaces::provision_personal_workspace,
    AppState,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::PgPool;
use tracing::{debug, instrument, trace};

/// Extract user from JWT session cookie if present and valid
/// Returns:
/// - None: No JWT cookie present
/// - Some(Ok(user)): Valid JWT found and verified
/// - Some(Err(error)): Cookie header present but malformed
#[instrument(skip(parts, config))]
fn try_jwt_session_auth(parts: &Parts, config: &crate::config::Config) -> Option<Result<CurrentUser>> {
    let cookie_header = parts.headers.get(axum::http::header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }))
        }
    };
    let cookie_name = &config.auth.native.session.cookie_name;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == cookie_name {
                // Try to verify the JWT session token. Verification errors are
                // expected for expired tokens, so keep checking other cookies.
                match session::verify_session_token(value, config) {
                    Ok(user) => return Some(Ok(user)),
                    Err(_) => continue,
                }
            }
        }
    }
    None
}

/// Extract user from the trusted proxy header if present and valid
/// Returns:
/// - None: No proxy header present
/// - Some(Ok(user)): Valid proxy header found and user authenticated
/// - Some(Err(error)): Proxy header present but user lookup/creation failed
#[instrument(skip(parts, config, db))]
async fn try_proxy_header_auth(parts: &Parts, config: &crate::config::Config, db: &PgPool) -> Option<Result<CurrentUser>> {
    let user_email = match parts.headers.get(&config.auth.proxy_header.header_name).and_then(|h| h.to_str().ok()) {
        Some(email) => email,
        None => return None,
    };

    let mut tx = match db.begin().await {
        Ok(tx) => tx,
        Err(e) => return Some(Err(DbError::from(e).into())),
    };

    let mut user_repo = Users::new(&mut tx);
    let user = match user_repo.get_user_by_email(user_email).await {
        Ok(Some(user)) => Some(user),
        Ok(None) => {
            if config.auth.proxy_header.auto_create_users {
                use crate::db::handlers::Repository as _;
                let create_request = UserCreateDBRequest {
                    username: user_email.to_string(),
                    email: user_email.to_string(),
                    display_name: None,
                    password_hash: None, // No password for SSO proxy users
                    is_superadmin: false,
                    auth_source: "proxy-header".to_string(),
                };

                let new_user = match user_repo.create(&create_request).await {
                    Ok(new_user) => new_user,
                    Err(e) => return Some(Err(Error::Database(e))),
                };

                // First-sight users get a personal workspace, same as signup
                if let Err(e) = provision_personal_workspace(&mut tx, &new_user).await {
                    return Some(Err(e));
                }
                Some(new_user)
            } else {
                None
            }
        }
        Err(e) => return Some(Err(Error::Database(e))),
    };

    match tx.commit().await {
        Ok(_) => {}
        Err(e) => return Some(Err(DbError::from(e).into())),
    }

    user.map(|u| Ok(CurrentUser::from(u)))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Try the enabled authentication methods in priority order. A request
        // carrying both a valid cookie and a proxy header authenticates as the
        // cookie's user.
        if state.config.auth.native.enabled {
            match try_jwt_session_auth(parts, &state.config) {
                Some(Ok(user)) => {
                    debug!("Found JWT session authenticated user: {}", user.id);
                    return Ok(user);
                }
                Some(Err(e)) => {
                    trace!("JWT session authentication failed: {:?}", e);
                }
                None => {
                    trace!("No JWT session authentication attempted");
                }
            }
        }

        if state.config.auth.proxy_header.enabled {
            match try_proxy_header_auth(parts, &state.config, &state.db).await {
                Some(Ok(user)) => {
                    debug!("Found proxy header authenticated user: {}", user.id);
                    return Ok(user);
                }
                Some(Err(e)) => {
                    trace!("Proxy header authentication failed: {:?}", e);
                }
                None => {
                    trace!("No proxy header authentication attempted");
                }
            }
        }

        Err(Error::Unauthenticated { message: None })
    }
}

/// Reject non-superadmin callers on platform administration endpoints
pub fn require_superadmin(user: &CurrentUser) -> Result<()> {
    if user.is_superadmin {
        Ok(())
    } else {
        Err(Error::SuperadminRequired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::CurrentUser;
    use crate::test_utils::{create_test_app_state, create_test_config, create_test_user};
    use axum::extract::FromRequestParts as _;
    use sqlx::PgPool;

    fn create_test_parts_with_header(header_name: &str, header_value: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header(header_name, header_value)
            .body(())
            .unwrap();

        let (parts, _body) = request.into_parts();
        parts
    }

    #[sqlx::test]
    async fn test_existing_user_extraction_via_proxy_header(pool: PgPool) {
        let mut config = create_test_config();
        config.auth.proxy_header.enabled = true;
        let state = create_test_app_state(pool.clone(), config).await;

        let test_user = create_test_user(&pool, "existing@example.com").await;

        let mut parts = create_test_parts_with_header("x-atrium-user", &test_user.email);

        let result = CurrentUser::from_request_parts(&mut parts, &state).await;
        let current_user = result.unwrap();
        assert_eq!(current_user.email, test_user.email);
        assert_eq!(current_user.username, test_user.username);
    }

    #[sqlx::test]
    async fn test_auto_create_provisions_personal_workspace(pool: PgPool) {
        let mut config = create_test_config();
        config.auth.proxy_header.enabled = true;
        let state = create_test_app_state(pool.clone(), config).await;

        let new_email = "newuser@example.com";
        let mut parts = create_test_parts_with_header("x-atrium-user", new_email);

        let current_user = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(current_user.email, new_email);

        // The user exists and has exactly one workspace with an owner membership
        let mut conn = pool.acquire().await.unwrap();
        let mut users = Users::new(&mut conn);
        let db_user = users.get_user_by_email(new_email).await.unwrap().unwrap();
        assert_eq!(db_user.auth_source, "proxy-header");
        assert!(!db_user.has_usable_password());

        let mut memberships = crate::db::handlers::Memberships::new(&mut conn);
        let workspace_ids = memberships.workspace_ids_for_user(db_user.id).await.unwrap();
        assert_eq!(workspace_ids.len(), 1);
    }

    #[sqlx::test]
    async fn test_missing_credentials_returns_unauthorized(pool: PgPool) {
        let state = create_test_app_state(pool.clone(), create_test_config()).await;

        let request = axum::http::Request::builder().uri("http://localhost/test").body(()).unwrap();
        let (mut parts, _body) = request.into_parts();

        let error = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert_eq!(error.status_code(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    async fn test_jwt_session_cookie_authentication(pool: PgPool) {
        let config = create_test_config();
        let state = create_test_app_state(pool.clone(), config.clone()).await;

        let user = create_test_user(&pool, "cookie@example.com").await;
        let token = session::create_session_token(&CurrentUser::from(user.clone()), &config).unwrap();

        let mut parts = create_test_parts_with_header(
            "cookie",
            &format!("{}={}", config.auth.native.session.cookie_name, token),
        );

        let current_user = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(current_user.id, user.id);
    }

    #[test]
    fn test_require_superadmin() {
        let mut user = CurrentUser {
            id: uuid::Uuid::new_v4(),
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            display_name: None,
            is_superadmin: true,
        };
        assert!(require_superadmin(&user).is_ok());

        user.is_superadmin = false;
        let error = require_superadmin(&user).unwrap_err();
        assert_eq!(error.status_code(), axum::http::StatusCode::FORBIDDEN);
    }
}
