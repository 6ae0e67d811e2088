//! Rate limiting configuration for API endpoints.
//!
//! Quotas are per client IP and follow governor's token bucket model:
//!
//! - Tokens are added at the configured rate (per second)
//! - Each request consumes one token
//! - Burst size caps how many tokens can accumulate
//!
//! # Configuration
//!
//! - `RATE_LIMIT_GENERAL_PER_SECOND`: Requests per second for general endpoints (default: 20)
//! - `RATE_LIMIT_GENERAL_BURST_SIZE`: Burst size for general endpoints (default: 40)
//! - `RATE_LIMIT_AUTH_PER_SECOND`: Requests per second for auth endpoints (default: 2)
//! - `RATE_LIMIT_AUTH_BURST_SIZE`: Burst size for auth endpoints (default: 5)

use std::num::NonZeroU32;

use governor::Quota;

use crate::{ConfigError, parse_or};

/// Rate limit configuration for the API.
///
/// Auth endpoints get their own, stricter bucket to slow down credential stuffing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub general_per_second: NonZeroU32,
    pub general_burst_size: NonZeroU32,
    pub auth_per_second: NonZeroU32,
    pub auth_burst_size: NonZeroU32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general_per_second: NonZeroU32::new(20).unwrap_or(NonZeroU32::MIN),
            general_burst_size: NonZeroU32::new(40).unwrap_or(NonZeroU32::MIN),
            auth_per_second: NonZeroU32::new(2).unwrap_or(NonZeroU32::MIN),
            auth_burst_size: NonZeroU32::new(5).unwrap_or(NonZeroU32::MIN),
        }
    }
}

impl RateLimitConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            general_per_second: positive(
                lookup,
                "RATE_LIMIT_GENERAL_PER_SECOND",
                defaults.general_per_second,
            )?,
            general_burst_size: positive(
                lookup,
                "RATE_LIMIT_GENERAL_BURST_SIZE",
                defaults.general_burst_size,
            )?,
            auth_per_second: positive(lookup, "RATE_LIMIT_AUTH_PER_SECOND", defaults.auth_per_second)?,
            auth_burst_size: positive(lookup, "RATE_LIMIT_AUTH_BURST_SIZE", defaults.auth_burst_size)?,
        })
    }

    /// Quota for general API endpoints.
    #[must_use]
    pub fn general_quota(&self) -> Quota {
        Quota::per_second(self.general_per_second).allow_burst(self.general_burst_size)
    }

    /// Quota for authentication endpoints.
    #[must_use]
    pub fn auth_quota(&self) -> Quota {
        Quota::per_second(self.auth_per_second).allow_burst(self.auth_burst_size)
    }
}

fn positive<F>(lookup: &F, key: &'static str, default: NonZeroU32) -> Result<NonZeroU32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw: u32 = parse_or(lookup, key, default.get())?;
    NonZeroU32::new(raw).ok_or(ConfigError::NotPositive(key))
}
