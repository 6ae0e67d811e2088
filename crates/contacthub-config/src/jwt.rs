//! JWT configuration.
//!
//! Access and refresh tokens are signed with distinct HMAC secrets and carry independent
//! lifetimes. The access lifetime must be strictly shorter than the refresh lifetime.

use std::time::Duration;

use crate::{ConfigError, non_empty, parse_or};

const DEV_ACCESS_SECRET: &str = "contacthub-dev-access-secret-change-me";
const DEV_REFRESH_SECRET: &str = "contacthub-dev-refresh-secret-change-me";

pub const DEFAULT_ISSUER: &str = "contacthub";
pub const DEFAULT_ACCESS_TTL_MINUTES: u64 = 60;
pub const DEFAULT_REFRESH_TTL_HOURS: u64 = 168;

#[derive(Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub issuer: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            access_secret: DEV_ACCESS_SECRET.to_string(),
            refresh_secret: DEV_REFRESH_SECRET.to_string(),
            access_ttl: Duration::from_secs(DEFAULT_ACCESS_TTL_MINUTES * 60),
            refresh_ttl: Duration::from_secs(DEFAULT_REFRESH_TTL_HOURS * 3600),
            issuer: DEFAULT_ISSUER.to_string(),
        }
    }
}

impl JwtConfig {
    /// Loads from `JWT_ACCESS_SECRET`, `JWT_REFRESH_SECRET`, `JWT_ACCESS_TTL_MINUTES`,
    /// `JWT_REFRESH_TTL_HOURS` and `JWT_ISSUER`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_secret = non_empty(lookup, "JWT_ACCESS_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_ACCESS_SECRET not set, using development secret");
            DEV_ACCESS_SECRET.to_string()
        });
        let refresh_secret = non_empty(lookup, "JWT_REFRESH_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_REFRESH_SECRET not set, using development secret");
            DEV_REFRESH_SECRET.to_string()
        });

        let access_minutes: u64 =
            parse_or(lookup, "JWT_ACCESS_TTL_MINUTES", DEFAULT_ACCESS_TTL_MINUTES)?;
        let refresh_hours: u64 =
            parse_or(lookup, "JWT_REFRESH_TTL_HOURS", DEFAULT_REFRESH_TTL_HOURS)?;

        let config = Self {
            access_secret,
            refresh_secret,
            access_ttl: Duration::from_secs(access_minutes.saturating_mul(60)),
            refresh_ttl: Duration::from_secs(refresh_hours.saturating_mul(3600)),
            issuer: non_empty(lookup, "JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_secret.is_empty() {
            return Err(ConfigError::Empty("JWT_ACCESS_SECRET"));
        }
        if self.refresh_secret.is_empty() {
            return Err(ConfigError::Empty("JWT_REFRESH_SECRET"));
        }
        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::SharedSecret);
        }
        if self.access_ttl.is_zero() {
            return Err(ConfigError::NotPositive("JWT_ACCESS_TTL_MINUTES"));
        }
        if self.access_ttl >= self.refresh_ttl {
            return Err(ConfigError::TtlOrder);
        }
        Ok(())
    }

    /// Access token lifetime in whole seconds, as reported in `expires_in`.
    pub fn access_ttl_secs(&self) -> i64 {
        i64::try_from(self.access_ttl.as_secs()).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::lookup;

    #[test]
    fn test_defaults() {
        let config = JwtConfig::from_lookup(&lookup(&[])).unwrap();
        assert_eq!(config.access_ttl, Duration::from_secs(3600));
        assert_eq!(config.refresh_ttl, Duration::from_secs(168 * 3600));
        assert_eq!(config.issuer, "contacthub");
        assert_eq!(config.access_ttl_secs(), 3600);
    }

    #[test]
    fn test_secrets_must_differ() {
        let err = JwtConfig::from_lookup(&lookup(&[
            ("JWT_ACCESS_SECRET", "same"),
            ("JWT_REFRESH_SECRET", "same"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::SharedSecret);
    }

    #[test]
    fn test_access_must_be_shorter_than_refresh() {
        let err = JwtConfig::from_lookup(&lookup(&[
            ("JWT_ACCESS_TTL_MINUTES", "120"),
            ("JWT_REFRESH_TTL_HOURS", "1"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::TtlOrder);
    }

    #[test]
    fn test_zero_access_ttl_is_rejected() {
        let err = JwtConfig::from_lookup(&lookup(&[("JWT_ACCESS_TTL_MINUTES", "0")])).unwrap_err();
        assert_eq!(err, ConfigError::NotPositive("JWT_ACCESS_TTL_MINUTES"));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let config = JwtConfig::default();
        let debug = format!("{config:?}");
        assert!(!debug.contains(DEV_ACCESS_SECRET));
        assert!(!debug.contains(DEV_REFRESH_SECRET));
    }
}
