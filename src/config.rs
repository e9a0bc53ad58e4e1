// Process-wide configuration, loaded once at startup

use std::time::Duration;

use crate::auth::error::AuthError;

// Development fallbacks; production deployments must override these
const DEV_ACCESS_SECRET: &str = "dev-access-secret-change-in-production";
const DEV_REFRESH_SECRET: &str = "dev-refresh-secret-change-in-production";
const DEFAULT_ACCESS_LIFETIME: &str = "20m";
const DEFAULT_REFRESH_LIFETIME: &str = "7d";

/// Immutable signing configuration for the session core
///
/// Constructed once in main and shared by reference; never mutated after
/// startup.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_lifetime: Duration,
    pub refresh_lifetime: Duration,
}

impl AuthConfig {
    /// Load configuration from environment variables with development defaults
    pub fn from_env() -> Result<Self, AuthError> {
        let access_secret = std::env::var("ACCESS_TOKEN_SECRET")
            .unwrap_or_else(|_| DEV_ACCESS_SECRET.to_string());
        let refresh_secret = std::env::var("REFRESH_TOKEN_SECRET")
            .unwrap_or_else(|_| DEV_REFRESH_SECRET.to_string());

        let access_lifetime = parse_lifetime(
            &std::env::var("ACCESS_TOKEN_LIFETIME")
                .unwrap_or_else(|_| DEFAULT_ACCESS_LIFETIME.to_string()),
        )?;
        let refresh_lifetime = parse_lifetime(
            &std::env::var("REFRESH_TOKEN_LIFETIME")
                .unwrap_or_else(|_| DEFAULT_REFRESH_LIFETIME.to_string()),
        )?;

        Ok(Self {
            access_secret,
            refresh_secret,
            access_lifetime,
            refresh_lifetime,
        })
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: DEV_ACCESS_SECRET.to_string(),
            refresh_secret: DEV_REFRESH_SECRET.to_string(),
            access_lifetime: Duration::from_secs(20 * 60),
            refresh_lifetime: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

/// Parse a lifetime string of the form `<number><unit>` where the unit is
/// `s` (seconds), `m` (minutes), `h` (hours) or `d` (days).
pub fn parse_lifetime(value: &str) -> Result<Duration, AuthError> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| invalid_lifetime(value))?;
    let (digits, unit) = value.split_at(split);

    let amount: u64 = digits.parse().map_err(|_| invalid_lifetime(value))?;
    let unit_secs: u64 = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return Err(invalid_lifetime(value)),
    };
    let seconds = amount
        .checked_mul(unit_secs)
        .ok_or_else(|| invalid_lifetime(value))?;

    Ok(Duration::from_secs(seconds))
}

fn invalid_lifetime(value: &str) -> AuthError {
    AuthError::ValidationError(format!(
        "invalid lifetime '{}': expected <number><s|m|h|d>",
        value
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_units() {
        assert_eq!(parse_lifetime("45s").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_lifetime("20m").unwrap(), Duration::from_secs(1200));
        assert_eq!(parse_lifetime("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_lifetime("7d").unwrap(), Duration::from_secs(604800));
    }

    #[test]
    fn rejects_malformed_lifetimes() {
        for bad in ["", "m", "20", "20w", "m20", "-5m", "1.5h"] {
            assert!(parse_lifetime(bad).is_err(), "expected error for {:?}", bad);
        }
    }

    #[test]
    fn rejects_overflowing_lifetimes() {
        // u64::MAX seconds is parseable; scaling it to days is not
        assert!(parse_lifetime("18446744073709551615d").is_err());
        assert!(parse_lifetime("300000000000000000d").is_err());
        // Largest representable values still parse
        assert!(parse_lifetime("18446744073709551615s").is_ok());
    }

    #[test]
    fn defaults_match_documented_lifetimes() {
        let config = AuthConfig::default();
        assert_eq!(config.access_lifetime, Duration::from_secs(20 * 60));
        assert_eq!(config.refresh_lifetime, Duration::from_secs(7 * 24 * 60 * 60));
    }
}
