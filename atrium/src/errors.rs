use crate::api::models::members::WorkspaceRole;
use crate::db::errors::DbError;
use crate::types::WorkspaceId;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided (or invalid)
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Workspace does not exist, the caller holds no membership in it, or the
    /// caller has no workspaces at all. The cases are deliberately
    /// indistinguishable to callers so that probing cannot enumerate other
    /// tenants' workspaces.
    #[error("Workspace not found")]
    WorkspaceNotFound { workspace_id: Option<WorkspaceId> },

    /// Platform-level administration endpoint, caller is not a superadmin
    #[error("Superadmin access required")]
    SuperadminRequired,

    /// Caller belongs to several workspaces and none was selected
    #[error("Workspace selection required")]
    WorkspaceSelectionRequired,

    /// Authenticated with a membership, but the role rank is too low
    #[error("Requires the {required:?} role in this workspace")]
    InsufficientRole { required: WorkspaceRole },

    /// The target membership is the workspace owner's
    #[error("The workspace owner cannot be removed or demoted")]
    OwnerProtected,

    /// Operation reserved for the workspace owner (e.g. deleting the workspace)
    #[error("Only the workspace owner can perform this operation")]
    OwnerRequired,

    /// Removing this member would leave the workspace without an admin
    #[error("A workspace must retain at least one admin")]
    LastAdmin,

    /// Feature gated behind the Pro plan
    #[error("This workspace is not on the Pro plan")]
    PlanRequired,

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Conflict error, e.g., for duplicate memberships
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::WorkspaceNotFound { .. } => StatusCode::NOT_FOUND,
            Error::SuperadminRequired => StatusCode::FORBIDDEN,
            Error::WorkspaceSelectionRequired => StatusCode::CONFLICT,
            Error::InsufficientRole { .. } => StatusCode::FORBIDDEN,
            Error::OwnerProtected => StatusCode::FORBIDDEN,
            Error::OwnerRequired => StatusCode::FORBIDDEN,
            Error::LastAdmin => StatusCode::CONFLICT,
            Error::PlanRequired => StatusCode::PAYMENT_REQUIRED,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::WorkspaceNotFound { .. } => "Workspace not found".to_string(),
            Error::SuperadminRequired => "Superadmin access required".to_string(),
            Error::WorkspaceSelectionRequired => "Select a workspace to continue".to_string(),
            Error::InsufficientRole { required } => format!("Requires the {required} role in this workspace"),
            Error::OwnerProtected => "The workspace owner cannot be removed or demoted".to_string(),
            Error::OwnerRequired => "Only the workspace owner can perform this operation".to_string(),
            Error::LastAdmin => "A workspace must retain at least one admin".to_string(),
            Error::PlanRequired => "Pro plan required".to_string(),
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::Conflict { message } => message.clone(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => {
                    // Provide user-friendly messages for common unique constraint violations
                    match (table.as_deref(), constraint.as_deref()) {
                        (Some("users"), Some(c)) if c.contains("email") => "An account with this email address already exists".to_string(),
                        (Some("users"), Some(c)) if c.contains("username") => "This username is already taken".to_string(),
                        (Some("workspaces"), Some(c)) if c.contains("slug") => "A workspace with this name already exists".to_string(),
                        (Some("memberships"), _) => "This user is already a member of the workspace".to_string(),
                        _ => "Resource already exists".to_string(),
                    }
                }
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Unauthenticated { .. }
            | Error::InsufficientRole { .. }
            | Error::SuperadminRequired
            | Error::OwnerProtected
            | Error::OwnerRequired
            | Error::PlanRequired => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::WorkspaceNotFound { .. } | Error::WorkspaceSelectionRequired | Error::LastAdmin => {
                tracing::debug!("Workspace resolution error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } | Error::Conflict { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();

        match &self {
            // Selection-required carries a machine-readable marker so the frontend
            // can route the user to the workspace picker.
            Error::WorkspaceSelectionRequired => {
                let body = json!({
                    "error": "workspace_selection_required",
                    "message": self.user_message(),
                });
                (status, axum::response::Json(body)).into_response()
            }
            Error::Database(DbError::UniqueViolation { .. }) | Error::Conflict { .. } => {
                let body = json!({ "message": self.user_message() });
                (status, axum::response::Json(body)).into_response()
            }
            _ => (status, self.user_message()).into_response(),
        }
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_taxonomy_status_codes() {
        let cases = [
            (Error::Unauthenticated { message: None }, StatusCode::UNAUTHORIZED),
            (
                Error::WorkspaceNotFound {
                    workspace_id: Some(Uuid::nil()),
                },
                StatusCode::NOT_FOUND,
            ),
            (Error::SuperadminRequired, StatusCode::FORBIDDEN),
            (Error::WorkspaceSelectionRequired, StatusCode::CONFLICT),
            (
                Error::InsufficientRole {
                    required: WorkspaceRole::Admin,
                },
                StatusCode::FORBIDDEN,
            ),
            (Error::OwnerProtected, StatusCode::FORBIDDEN),
            (Error::LastAdmin, StatusCode::CONFLICT),
            (Error::PlanRequired, StatusCode::PAYMENT_REQUIRED),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected, "wrong status for {error:?}");
        }
    }

    #[test]
    fn test_not_found_message_does_not_reveal_membership_state() {
        // The same message must come back whether the workspace is missing or the
        // caller simply has no membership - and it never echoes the probed id.
        let id = Uuid::new_v4();
        let missing = Error::WorkspaceNotFound { workspace_id: Some(id) };
        let no_membership = Error::WorkspaceNotFound { workspace_id: Some(id) };
        assert_eq!(missing.user_message(), no_membership.user_message());
        assert!(!missing.user_message().contains(&id.to_string()));
    }

    #[test]
    fn test_unique_violation_messages() {
        let err = Error::Database(DbError::UniqueViolation {
            constraint: Some("users_email_unique".to_string()),
            table: Some("users".to_string()),
            message: "duplicate key".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(err.user_message().contains("email"));
    }
}
