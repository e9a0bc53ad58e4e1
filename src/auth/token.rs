// JWT signing and verification

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::error::AuthError;
use crate::auth::models::Role;
use crate::config::AuthConfig;

/// JWT claims structure
///
/// This shape is a stable contract: downstream services decode and inspect
/// these fields directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Credential identifier
    pub sub: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Unique per issuance event; the revocation key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Issued-at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds
    #[serde(default)]
    pub exp: i64,
}

/// The two token classes, each with its own secret and lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Signs and verifies bearer tokens against per-kind secrets
pub struct TokenCodec {
    access_key: (EncodingKey, DecodingKey),
    refresh_key: (EncodingKey, DecodingKey),
    access_lifetime_secs: i64,
    refresh_lifetime_secs: i64,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_key: (
                EncodingKey::from_secret(config.access_secret.as_bytes()),
                DecodingKey::from_secret(config.access_secret.as_bytes()),
            ),
            refresh_key: (
                EncodingKey::from_secret(config.refresh_secret.as_bytes()),
                DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            ),
            access_lifetime_secs: config.access_lifetime.as_secs() as i64,
            refresh_lifetime_secs: config.refresh_lifetime.as_secs() as i64,
        }
    }

    pub fn lifetime_secs(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.access_lifetime_secs,
            TokenKind::Refresh => self.refresh_lifetime_secs,
        }
    }

    fn encoding_key(&self, kind: TokenKind) -> &EncodingKey {
        match kind {
            TokenKind::Access => &self.access_key.0,
            TokenKind::Refresh => &self.refresh_key.0,
        }
    }

    fn decoding_key(&self, kind: TokenKind) -> &DecodingKey {
        match kind {
            TokenKind::Access => &self.access_key.1,
            TokenKind::Refresh => &self.refresh_key.1,
        }
    }

    /// Sign a token of the given kind; `iat`/`exp` are stamped here
    pub fn sign(
        &self,
        kind: TokenKind,
        sub: &str,
        email: &str,
        role: Option<Role>,
        jti: Option<&str>,
    ) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            email: email.to_string(),
            role,
            jti: jti.map(|j| j.to_string()),
            iat: now,
            exp: now + self.lifetime_secs(kind),
        };

        encode(&Header::new(Algorithm::HS256), &claims, self.encoding_key(kind))
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    /// Verify signature and expiry against the kind's secret
    ///
    /// No expiry leeway: a blacklist entry's TTL is exactly the token's
    /// remaining lifetime, so the token must be rejected the moment the
    /// entry can lapse.
    pub fn decode(&self, kind: TokenKind, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, self.decoding_key(kind), &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::InvalidToken,
            })
    }

    /// Verify the signature but not the expiry
    ///
    /// Logout needs the `jti` of tokens that may already be past their expiry.
    pub fn decode_ignoring_expiry(
        &self,
        kind: TokenKind,
        token: &str,
    ) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, self.decoding_key(kind), &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    fn test_codec() -> TokenCodec {
        TokenCodec::new(&AuthConfig::default())
    }

    fn codec_with_secrets(access: &str, refresh: &str) -> TokenCodec {
        TokenCodec::new(&AuthConfig {
            access_secret: access.to_string(),
            refresh_secret: refresh.to_string(),
            ..AuthConfig::default()
        })
    }

    // Signs a token that expired in the past, bypassing the codec's stamping
    fn expired_token(secret: &str) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user-1".to_string(),
            email: "test@example.com".to_string(),
            role: Some(Role::User),
            jti: Some("jti-1".to_string()),
            iat: now - 1000,
            exp: now - 500,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn access_token_round_trips() {
        let codec = test_codec();
        let token = codec
            .sign(TokenKind::Access, "user-1", "test@example.com", Some(Role::User), Some("jti-1"))
            .unwrap();
        let claims = codec.decode(TokenKind::Access, &token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.role, Some(Role::User));
        assert_eq!(claims.jti.as_deref(), Some("jti-1"));
        assert_eq!(claims.exp - claims.iat, 20 * 60);
    }

    #[test]
    fn refresh_token_carries_its_own_lifetime() {
        let codec = test_codec();
        let token = codec
            .sign(TokenKind::Refresh, "user-1", "test@example.com", None, None)
            .unwrap();
        let claims = codec.decode(TokenKind::Refresh, &token).unwrap();

        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
        assert_eq!(claims.role, None);
        assert_eq!(claims.jti, None);
    }

    #[test]
    fn kinds_use_distinct_secrets() {
        let codec = codec_with_secrets("access-secret", "refresh-secret");
        let access = codec
            .sign(TokenKind::Access, "user-1", "test@example.com", None, None)
            .unwrap();
        let refresh = codec
            .sign(TokenKind::Refresh, "user-1", "test@example.com", None, None)
            .unwrap();

        // A token of one kind never verifies under the other kind's secret
        assert!(codec.decode(TokenKind::Refresh, &access).is_err());
        assert!(codec.decode(TokenKind::Access, &refresh).is_err());
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let ours = codec_with_secrets("secret-one", "secret-one");
        let theirs = codec_with_secrets("secret-two", "secret-two");

        let token = theirs
            .sign(TokenKind::Access, "user-1", "test@example.com", None, None)
            .unwrap();
        assert!(matches!(
            ours.decode(TokenKind::Access, &token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec_with_secrets("access-secret", "refresh-secret");
        let token = expired_token("access-secret");
        assert!(matches!(
            codec.decode(TokenKind::Access, &token),
            Err(AuthError::ExpiredToken)
        ));
    }

    #[test]
    fn expiry_is_enforced_without_leeway() {
        // A token expired by a single second must already be rejected;
        // otherwise it would outlive its blacklist entry.
        let codec = codec_with_secrets("access-secret", "refresh-secret");
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "user-1".to_string(),
            email: "test@example.com".to_string(),
            role: None,
            jti: Some("jti-1".to_string()),
            iat: now - 10,
            exp: now - 2,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret("access-secret".as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            codec.decode(TokenKind::Access, &token),
            Err(AuthError::ExpiredToken)
        ));
    }

    #[test]
    fn expired_token_still_decodes_for_logout() {
        let codec = codec_with_secrets("access-secret", "refresh-secret");
        let token = expired_token("access-secret");
        let claims = codec.decode_ignoring_expiry(TokenKind::Access, &token).unwrap();
        assert_eq!(claims.jti.as_deref(), Some("jti-1"));
    }

    #[test]
    fn relaxed_decode_still_checks_the_signature() {
        let codec = codec_with_secrets("access-secret", "refresh-secret");
        let token = expired_token("some-other-secret");
        assert!(codec.decode_ignoring_expiry(TokenKind::Access, &token).is_err());
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let codec = test_codec();
        for token in ["", "not.a.token", "invalid_token_format"] {
            assert!(codec.decode(TokenKind::Access, token).is_err());
            assert!(codec.decode_ignoring_expiry(TokenKind::Access, token).is_err());
        }
    }

    #[test]
    fn configured_lifetimes_are_honored() {
        let codec = TokenCodec::new(&AuthConfig {
            access_lifetime: Duration::from_secs(90),
            refresh_lifetime: Duration::from_secs(3600),
            ..AuthConfig::default()
        });
        let token = codec
            .sign(TokenKind::Access, "user-1", "test@example.com", None, None)
            .unwrap();
        let claims = codec.decode(TokenKind::Access, &token).unwrap();
        assert_eq!(claims.exp - claims.iat, 90);
    }

    proptest! {
        #[test]
        fn prop_claims_survive_a_round_trip(
            sub in "[a-f0-9]{8}",
            email in "[a-z]{3,10}@[a-z]{3,10}\\.(com|org|net)",
            jti in "[a-f0-9]{16}"
        ) {
            let codec = test_codec();
            let token = codec
                .sign(TokenKind::Access, &sub, &email, Some(Role::User), Some(&jti))
                .unwrap();
            let claims = codec.decode(TokenKind::Access, &token).unwrap();

            prop_assert_eq!(claims.sub, sub);
            prop_assert_eq!(claims.email, email);
            prop_assert_eq!(claims.jti, Some(jti));
        }

        #[test]
        fn prop_random_strings_are_rejected(malformed in "[a-zA-Z0-9]{10,50}") {
            let codec = test_codec();
            prop_assert!(codec.decode(TokenKind::Access, &malformed).is_err());
        }
    }
}
