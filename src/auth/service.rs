// Credential service: registration, login, refresh and logout orchestration

use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::auth::models::{AuthResponse, NewUser, Role, UserResponse};
use crate::auth::password::PasswordService;
use crate::auth::repository::CredentialStore;
use crate::auth::session::SessionManager;

/// Coordinates the password hasher, session manager and credential store
pub struct AuthService {
    users: Arc<dyn CredentialStore>,
    sessions: Arc<SessionManager>,
}

impl AuthService {
    pub fn new(users: Arc<dyn CredentialStore>, sessions: Arc<SessionManager>) -> Self {
        Self { users, sessions }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Register a new credential with the default role.
    ///
    /// Returns public fields only; the password hash never leaves this layer.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        address: Option<String>,
    ) -> Result<UserResponse, AuthError> {
        PasswordService::validate_password_strength(password)?;

        if self.users.find_by_email(email).await?.is_some() {
            debug!("Registration rejected: email already in use");
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = PasswordService::hash_password(password)?;
        let user = self
            .users
            .create(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                address,
                password_hash,
                role: Role::default(),
            })
            .await?;

        info!("Registered new user {}", user.id);
        Ok(user.into())
    }

    /// Verify credentials and issue a token pair.
    ///
    /// An unknown email and a wrong password produce the identical error so
    /// callers cannot enumerate accounts.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            warn!("Login failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !PasswordService::verify_password(password, &user.password_hash) {
            warn!("Login failed for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.sessions.generate_tokens(
            &user.id.to_string(),
            &user.email,
            Some(user.role()),
        )?;

        info!("User {} logged in", user.id);
        Ok(AuthResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            user: user.into(),
        })
    }

    /// Rotate an access token from a valid refresh token
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        self.sessions.refresh_access_token(refresh_token).await
    }

    /// Best-effort revocation; never fails visibly to the caller
    pub async fn logout(&self, access_token: &str, refresh_token: Option<&str>) {
        self.sessions.revoke_on_logout(access_token, refresh_token).await;
    }

    /// Public fields of the credential identified by `user_id`
    pub async fn current_user(&self, user_id: Uuid) -> Result<UserResponse, AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        Ok(user.into())
    }

    /// All credentials, public fields only (admin surface)
    pub async fn list_users(&self) -> Result<Vec<UserResponse>, AuthError> {
        let users = self.users.list().await?;
        Ok(users.into_iter().map(Into::into).collect())
    }
}
