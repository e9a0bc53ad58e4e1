// Request authentication and role-based authorization

use axum::{
    async_trait,
    body::Body,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::auth::models::Role;
use crate::auth::session::SessionManager;

/// Identity resolved from a verified, non-revoked access token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Option<Role>,
}

/// Per-request authorization decision.
///
/// Pure function: no I/O, no side effects. An empty allowed set means the
/// operation carries no role restriction.
pub fn authorize(
    identity: Option<&AuthenticatedUser>,
    allowed: &[Role],
) -> Result<(), AuthError> {
    if allowed.is_empty() {
        return Ok(());
    }
    let Some(identity) = identity else {
        return Err(AuthError::NotAuthenticated);
    };
    let Some(role) = identity.role else {
        return Err(AuthError::NoRoleAssigned);
    };
    if !allowed.contains(&role) {
        return Err(AuthError::InsufficientRole {
            required: allowed.to_vec(),
            actual: role,
        });
    }
    Ok(())
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidToken)
}

fn identity_from_claims(claims: crate::auth::token::Claims) -> Result<AuthenticatedUser, AuthError> {
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
    Ok(AuthenticatedUser {
        user_id,
        email: claims.email,
        role: claims.role,
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    Arc<SessionManager>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = Arc::<SessionManager>::from_ref(state);
        let token = bearer_token(&parts.headers)?;
        let claims = sessions.verify_access_token(token).await?;
        identity_from_claims(claims)
    }
}

/// Explicit per-route role requirement.
///
/// Attached to routes as a `from_fn` layer; the allowed set is plain data
/// consulted by `authorize`, not handler metadata.
#[derive(Clone)]
pub struct RequireRole {
    sessions: Arc<SessionManager>,
    allowed: &'static [Role],
}

impl RequireRole {
    pub fn new(sessions: Arc<SessionManager>, allowed: &'static [Role]) -> Self {
        Self { sessions, allowed }
    }

    pub fn admin(sessions: Arc<SessionManager>) -> Self {
        Self::new(sessions, &[Role::Admin])
    }

    /// Middleware entry point for `axum::middleware::from_fn`
    pub async fn middleware(
        self,
        request: Request<Body>,
        next: Next,
    ) -> Result<Response, AuthError> {
        let endpoint = request.uri().path().to_string();

        // No restriction declared for this route
        if self.allowed.is_empty() {
            return Ok(next.run(request).await);
        }

        let identity = match bearer_token(request.headers()) {
            Ok(token) => {
                let claims = self.sessions.verify_access_token(token).await.map_err(|e| {
                    warn!("Token rejected for endpoint {}: {}", endpoint, e);
                    e
                })?;
                Some(identity_from_claims(claims)?)
            }
            Err(AuthError::MissingToken) => None,
            Err(e) => {
                warn!("Malformed Authorization header for endpoint {}", endpoint);
                return Err(e);
            }
        };

        authorize(identity.as_ref(), self.allowed)?;

        debug!("Authorization successful for endpoint {}", endpoint);
        Ok(next.run(request).await)
    }
}
