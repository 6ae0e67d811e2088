//! Per-route deadlines.

use std::time::Duration;

use crate::{ConfigError, parse_or};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Default deadline for API routes (`REQUEST_TIMEOUT_SECS`, default 30).
    pub request: Duration,
    /// Deadline for `/api/auth/*` (`AUTH_TIMEOUT_SECS`, default 10).
    pub auth: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
            auth: Duration::from_secs(10),
        }
    }
}

impl TimeoutConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let request: u64 = parse_or(lookup, "REQUEST_TIMEOUT_SECS", 30)?;
        let auth: u64 = parse_or(lookup, "AUTH_TIMEOUT_SECS", 10)?;

        if request == 0 {
            return Err(ConfigError::NotPositive("REQUEST_TIMEOUT_SECS"));
        }
        if auth == 0 {
            return Err(ConfigError::NotPositive("AUTH_TIMEOUT_SECS"));
        }

        Ok(Self {
            request: Duration::from_secs(request),
            auth: Duration::from_secs(auth),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::lookup;

    #[test]
    fn test_defaults() {
        assert_eq!(
            TimeoutConfig::from_lookup(&lookup(&[])).unwrap(),
            TimeoutConfig::default()
        );
    }

    #[test]
    fn test_overrides() {
        let config = TimeoutConfig::from_lookup(&lookup(&[
            ("REQUEST_TIMEOUT_SECS", "2"),
            ("AUTH_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.request, Duration::from_secs(2));
        assert_eq!(config.auth, Duration::from_secs(5));
    }

    #[test]
    fn test_zero_is_rejected() {
        let err = TimeoutConfig::from_lookup(&lookup(&[("AUTH_TIMEOUT_SECS", "0")])).unwrap_err();
        assert_eq!(err, ConfigError::NotPositive("AUTH_TIMEOUT_SECS"));
    }
}
