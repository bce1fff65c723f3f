//! Authentication handlers: registration, login, logout, password change.

use crate::api::models::users::{CurrentUser, LoginRequest, PasswordChangeRequest, RegisterRequest, UserResponse};
use crate::auth::{password, session};
use crate::db::handlers::{Repository as _, Users};
use crate::db::models::users::{UserCreateDBRequest, UserUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::workspaces::provision_personal_workspace;
use crate::AppState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::AppendHeaders,
    Json,
};
use tracing::info;

/// Derive a username from an email's local part when none was supplied
fn username_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or("");
    if local.is_empty() {
        "user".to_string()
    } else {
        local.to_string()
    }
}

#[utoipa::path(
    post,
    path = "/authentication/register",
    tag = "authentication",
    summary = "Register a new account",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Registration disabled or invalid request"),
        (status = 409, description = "Email or username already taken")
    )
)]
#[tracing::instrument(skip_all, fields(email = %request.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, AppendHeaders<[(header::HeaderName, String); 1]>, Json<UserResponse>)> {
    if !state.config.auth.native.enabled || !state.config.auth.native.allow_registration {
        return Err(Error::BadRequest {
            message: "Registration is disabled".to_string(),
        });
    }

    let email = request.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::BadRequest {
            message: "A valid email address is required".to_string(),
        });
    }
    if request.password.len() < 8 {
        return Err(Error::BadRequest {
            message: "Password must be at least 8 characters".to_string(),
        });
    }

    let password_hash = password::hash_string(&request.password)?;

    // User + personal workspace are provisioned atomically: a signup never
    // produces an account with zero workspaces.
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut tx);

    let user = users
        .create(&UserCreateDBRequest {
            username: request.username.unwrap_or_else(|| username_from_email(&email)),
            email,
            display_name: request.display_name,
            password_hash: Some(password_hash),
            is_superadmin: false,
            auth_source: "native".to_string(),
        })
        .await?;

    provision_personal_workspace(&mut tx, &user).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    info!(user_id = %user.id, "Registered new user");

    let current = CurrentUser::from(user.clone());
    let token = session::create_session_token(&current, &state.config)?;
    let cookie = session::session_cookie(&token, &state.config);

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(UserResponse::from(user)),
    ))
}

#[utoipa::path(
    post,
    path = "/authentication/login",
    tag = "authentication",
    summary = "Log in with email and password",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = CurrentUser),
        (status = 401, description = "Invalid credentials")
    )
)]
#[tracing::instrument(skip_all, fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(AppendHeaders<[(header::HeaderName, String); 1]>, Json<CurrentUser>)> {
    if !state.config.auth.native.enabled {
        return Err(Error::Unauthenticated {
            message: Some("Native authentication is disabled".to_string()),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    // A single failure path for unknown email, disabled account, missing
    // password, and wrong password: no credential probing.
    let invalid = || Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    };

    let user = users
        .get_user_by_email(request.email.trim().to_lowercase().as_str())
        .await?
        .ok_or_else(invalid)?;

    if !user.active {
        return Err(invalid());
    }

    let password_hash = user.password_hash.as_deref().ok_or_else(invalid)?;
    if !password::verify_string(&request.password, password_hash)? {
        return Err(invalid());
    }

    let current = CurrentUser::from(user);
    let token = session::create_session_token(&current, &state.config)?;
    let cookie = session::session_cookie(&token, &state.config);

    info!(user_id = %current.id, "User logged in");

    Ok((AppendHeaders([(header::SET_COOKIE, cookie)]), Json(current)))
}

#[utoipa::path(
    post,
    path = "/authentication/logout",
    tag = "authentication",
    summary = "Log out",
    responses((status = 204, description = "Session cookie cleared"))
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> (StatusCode, AppendHeaders<[(header::HeaderName, String); 1]>) {
    let cookie = session::clear_session_cookie(&state.config);
    (StatusCode::NO_CONTENT, AppendHeaders([(header::SET_COOKIE, cookie)]))
}

#[utoipa::path(
    post,
    path = "/authentication/password-change",
    tag = "authentication",
    summary = "Change the current user's password",
    request_body = PasswordChangeRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 401, description = "Not authenticated or wrong current password")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn change_password(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<PasswordChangeRequest>,
) -> Result<StatusCode> {
    if request.new_password.len() < 8 {
        return Err(Error::BadRequest {
            message: "Password must be at least 8 characters".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    let user = users.get_by_id(current_user.id).await?.ok_or_else(|| Error::Unauthenticated {
        message: None,
    })?;

    // SSO-provisioned users have no current password to verify; they set
    // their first one here.
    if let Some(existing_hash) = user.password_hash.as_deref() {
        if !password::verify_string(&request.current_password, existing_hash)? {
            return Err(Error::Unauthenticated {
                message: Some("Current password is incorrect".to_string()),
            });
        }
    }

    let new_hash = password::hash_string(&request.new_password)?;
    users
        .update(
            user.id,
            &UserUpdateDBRequest {
                password_hash: Some(new_hash),
                ..Default::default()
            },
        )
        .await?;

    info!(user_id = %user.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}
