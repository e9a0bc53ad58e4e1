// Password hashing and verification

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use scrypt::{scrypt, Params};
use subtle::ConstantTimeEq;

use crate::auth::error::AuthError;

const SALT_LEN: usize = 32;
const KEY_LEN: usize = 64;

// scrypt cost parameters: N = 2^14 = 16384, r = 8, p = 1
const LOG_N: u8 = 14;
const R: u32 = 8;
const P: u32 = 1;

/// Password service for hashing and verification
///
/// Stored format is `base64(salt):base64(derived key)` with a 32-byte random
/// salt and a 64-byte scrypt-derived key.
pub struct PasswordService;

impl PasswordService {
    fn params() -> Result<Params, AuthError> {
        Params::new(LOG_N, R, P, KEY_LEN).map_err(|_| AuthError::PasswordHashError)
    }

    fn derive(password: &str, salt: &[u8]) -> Result<[u8; KEY_LEN], AuthError> {
        let mut key = [0u8; KEY_LEN];
        scrypt(password.as_bytes(), salt, &Self::params()?, &mut key)
            .map_err(|_| AuthError::PasswordHashError)?;
        Ok(key)
    }

    /// Hash a password with a fresh random salt
    ///
    /// Two calls with the same password produce different strings.
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);

        let key = Self::derive(password, &salt)?;
        Ok(format!("{}:{}", BASE64.encode(salt), BASE64.encode(key)))
    }

    /// Verify a password against a stored hash
    ///
    /// Any malformed input (missing component, invalid base64, wrong key
    /// length) returns `false`; this function never errors past the
    /// comparison boundary. The key comparison is constant-time.
    pub fn verify_password(password: &str, stored: &str) -> bool {
        let Some((salt_b64, key_b64)) = stored.split_once(':') else {
            return false;
        };
        if salt_b64.is_empty() || key_b64.is_empty() {
            return false;
        }

        let Ok(salt) = BASE64.decode(salt_b64) else {
            return false;
        };
        let Ok(expected) = BASE64.decode(key_b64) else {
            return false;
        };
        // Key length is fixed by the algorithm; a mismatch is malformed input,
        // not a secret-dependent branch.
        if expected.len() != KEY_LEN {
            return false;
        }

        let Ok(derived) = Self::derive(password, &salt) else {
            return false;
        };
        derived.as_slice().ct_eq(expected.as_slice()).into()
    }

    /// Validate password strength requirements
    ///
    /// At least 8 characters, containing at least one letter and one digit.
    pub fn validate_password_strength(password: &str) -> Result<(), AuthError> {
        if password.len() < 8 {
            return Err(AuthError::ValidationError(
                "Password must be at least 8 characters long".to_string(),
            ));
        }
        if !password.chars().any(|c| c.is_ascii_alphabetic()) {
            return Err(AuthError::ValidationError(
                "Password must contain at least one letter".to_string(),
            ));
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AuthError::ValidationError(
                "Password must contain at least one digit".to_string(),
            ));
        }
        Ok(())
    }
}
