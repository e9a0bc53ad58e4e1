// Session manager: token issuance, verification, rotation and revocation
//
// Token lifecycle per identifier:
//   issued -> valid (now < exp and jti not revoked) -> expired | revoked
// Both terminal states are absorbing; there is no un-revoke.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::blacklist::{RevocationEntry, RevocationStore};
use crate::auth::error::AuthError;
use crate::auth::models::Role;
use crate::auth::token::{Claims, TokenCodec, TokenKind};

/// An access/refresh pair minted for one login event
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues token pairs and checks tokens against signature, expiry and the
/// revocation store.
pub struct SessionManager {
    codec: TokenCodec,
    store: Arc<dyn RevocationStore>,
}

impl SessionManager {
    pub fn new(codec: TokenCodec, store: Arc<dyn RevocationStore>) -> Self {
        Self { codec, store }
    }

    /// Mint an access/refresh pair for a credential.
    ///
    /// Both tokens of the pair share one freshly minted `jti`, so a single
    /// revocation at logout invalidates the whole pair. No I/O happens here;
    /// both tokens are signed from the same in-memory claim set.
    pub fn generate_tokens(
        &self,
        user_id: &str,
        email: &str,
        role: Option<Role>,
    ) -> Result<TokenPair, AuthError> {
        let jti = Uuid::new_v4().to_string();

        let access_token =
            self.codec
                .sign(TokenKind::Access, user_id, email, role, Some(&jti))?;
        let refresh_token =
            self.codec
                .sign(TokenKind::Refresh, user_id, email, role, Some(&jti))?;

        debug!("Issued token pair for subject {}", user_id);
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Verify an access token: signature, expiry, then revocation state
    pub async fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(TokenKind::Access, token).await
    }

    /// Verify a refresh token: signature, expiry, then revocation state
    pub async fn verify_refresh_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(TokenKind::Refresh, token).await
    }

    async fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, AuthError> {
        let claims = self.codec.decode(kind, token)?;

        if self.is_token_blacklisted(claims.jti.as_deref()).await? {
            warn!("Rejected revoked token for subject {}", claims.sub);
            return Err(AuthError::RevokedToken);
        }

        Ok(claims)
    }

    /// Mint a new access token from a valid refresh token.
    ///
    /// The new token carries the refresh token's subject, email and role but
    /// a brand-new `jti`, making it revocable independently of the refresh
    /// token that produced it.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.verify_refresh_token(refresh_token).await?;

        let jti = Uuid::new_v4().to_string();
        self.codec.sign(
            TokenKind::Access,
            &claims.sub,
            &claims.email,
            claims.role,
            Some(&jti),
        )
    }

    /// Record a revocation entry with TTL equal to the token's remaining
    /// lifetime. A no-op for already-expired tokens: there is nothing left
    /// to protect.
    pub async fn blacklist_token(&self, jti: &str, expiry_epoch: i64) -> Result<(), AuthError> {
        let remaining = expiry_epoch - Utc::now().timestamp();
        if remaining <= 0 {
            debug!("Skipping blacklist of already-expired token {}", jti);
            return Ok(());
        }

        self.store
            .insert(jti, &RevocationEntry::new(jti), remaining as u64)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))
    }

    /// Check revocation state. `None` means the token carries no identifier
    /// and is treated as never revoked, without touching the store.
    pub async fn is_token_blacklisted(&self, jti: Option<&str>) -> Result<bool, AuthError> {
        let Some(jti) = jti else {
            return Ok(false);
        };
        self.store
            .contains(jti)
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))
    }

    /// Best-effort revocation at logout.
    ///
    /// Claims are decoded past expiry so a stale access token still yields
    /// its `jti`. Every failure on this path is logged and swallowed; logout
    /// never fails visibly. If a token carries no readable expiry the
    /// fallback window is the configured lifetime for its kind.
    pub async fn revoke_on_logout(&self, access_token: &str, refresh_token: Option<&str>) {
        self.revoke_single(TokenKind::Access, access_token).await;
        if let Some(refresh) = refresh_token {
            self.revoke_single(TokenKind::Refresh, refresh).await;
        }
    }

    async fn revoke_single(&self, kind: TokenKind, token: &str) {
        let claims = match self.codec.decode_ignoring_expiry(kind, token) {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Logout: could not decode token claims: {}", e);
                return;
            }
        };

        let Some(jti) = claims.jti else {
            debug!("Logout: token carries no jti, nothing to revoke");
            return;
        };

        let expiry = if claims.exp > 0 {
            claims.exp
        } else {
            Utc::now().timestamp() + self.codec.lifetime_secs(kind)
        };

        if let Err(e) = self.blacklist_token(&jti, expiry).await {
            warn!("Logout: blacklist write failed for {}: {}", jti, e);
        }
    }
}
