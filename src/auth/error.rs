// Authentication and authorization error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use tracing::{error, warn};

use crate::auth::models::Role;

/// Authentication and authorization error types
///
/// Variants distinguish internal causes for logging; the HTTP boundary
/// collapses every token-verification failure to the same generic 401 so
/// callers cannot distinguish bad-signature from expired from revoked.
#[derive(Debug)]
pub enum AuthError {
    // Authentication errors
    ValidationError(String),
    InvalidCredentials,
    InvalidToken,
    ExpiredToken,
    RevokedToken,
    MissingToken,
    EmailAlreadyExists,
    DatabaseError(String),
    PasswordHashError,
    TokenGenerationError(String),
    /// Revocation store unreachable while determining token status.
    /// Fail-closed: surfaced as an authentication failure, never as "not revoked".
    StoreUnavailable(String),

    // Authorization errors
    NotAuthenticated,
    NoRoleAssigned,
    /// Caller is authenticated but its role is not in the allowed set
    InsufficientRole { required: Vec<Role>, actual: Role },
}

impl AuthError {
    fn required_roles(required: &[Role]) -> String {
        let names: Vec<&str> = required.iter().map(Role::as_str).collect();
        format!("{{{}}}", names.join(", "))
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::ExpiredToken => write!(f, "Token has expired"),
            AuthError::RevokedToken => write!(f, "Token has been revoked"),
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::EmailAlreadyExists => write!(f, "Email already exists"),
            AuthError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AuthError::PasswordHashError => write!(f, "Password hashing error"),
            AuthError::TokenGenerationError(msg) => write!(f, "Token generation error: {}", msg),
            AuthError::StoreUnavailable(msg) => write!(f, "Revocation store unavailable: {}", msg),
            AuthError::NotAuthenticated => write!(f, "Not authenticated"),
            AuthError::NoRoleAssigned => write!(f, "No role assigned"),
            AuthError::InsufficientRole { required, actual } => write!(
                f,
                "role '{}' not in required roles {}",
                actual,
                Self::required_roles(required)
            ),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string())
            }
            // One generic message for every token failure: bad signature,
            // malformed, expired, revoked and missing header are indistinguishable
            // to the caller.
            AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::RevokedToken
            | AuthError::MissingToken
            | AuthError::NotAuthenticated => {
                warn!("Rejected request: {}", self);
                (StatusCode::UNAUTHORIZED, "Invalid or expired token".to_string())
            }
            AuthError::StoreUnavailable(msg) => {
                // Revocation status could not be determined; treat as untrusted
                error!("Revocation store unavailable during verification: {}", msg);
                (StatusCode::UNAUTHORIZED, "Invalid or expired token".to_string())
            }
            AuthError::EmailAlreadyExists => {
                (StatusCode::CONFLICT, "Email already exists".to_string())
            }
            AuthError::DatabaseError(msg) => {
                error!("Database error in auth: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AuthError::PasswordHashError => {
                error!("Password hashing error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AuthError::TokenGenerationError(msg) => {
                error!("Token generation error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AuthError::NoRoleAssigned => {
                warn!("Authorization failed: no role assigned");
                (StatusCode::FORBIDDEN, "No role assigned".to_string())
            }
            // Role detail is acceptable to disclose, unlike authentication detail
            AuthError::InsufficientRole { required, actual } => {
                warn!(
                    "Authorization failed: role '{}' not in required roles {}",
                    actual,
                    Self::required_roles(required)
                );
                (
                    StatusCode::FORBIDDEN,
                    format!(
                        "role '{}' not in required roles {}",
                        actual,
                        Self::required_roles(required)
                    ),
                )
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::RevokedToken
            | AuthError::MissingToken
            | AuthError::StoreUnavailable(_)
            | AuthError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AuthError::EmailAlreadyExists => StatusCode::CONFLICT,
            AuthError::DatabaseError(_)
            | AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::NoRoleAssigned | AuthError::InsufficientRole { .. } => {
                StatusCode::FORBIDDEN
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_share_a_status_code() {
        for err in [
            AuthError::InvalidToken,
            AuthError::ExpiredToken,
            AuthError::RevokedToken,
            AuthError::MissingToken,
            AuthError::StoreUnavailable("connection refused".to_string()),
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn insufficient_role_names_both_sides() {
        let err = AuthError::InsufficientRole {
            required: vec![Role::Admin],
            actual: Role::User,
        };
        let msg = err.to_string();
        assert!(msg.contains("user"));
        assert!(msg.contains("admin"));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
