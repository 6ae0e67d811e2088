//! # ContactHub Config
//!
//! Immutable configuration for the ContactHub API, built once at startup.
//!
//! - [`jwt`]: token secrets, lifetimes and issuer
//! - [`timeout`]: per-route deadlines
//! - [`cors`]: allowed origins
//! - [`rate_limit`]: per-client quotas
//! - [`server`]: listener addresses, log directory, observability switch
//!
//! Every section reads its variables through a lookup function, so tests can feed a map
//! instead of mutating the process environment. Values that are present but malformed are
//! rejected rather than replaced by defaults.
//!
//! # Example
//!
//! ```ignore
//! use contacthub_config::AppConfig;
//!
//! dotenvy::dotenv().ok();
//! let config = AppConfig::from_env()?;
//! ```

use std::path::PathBuf;
use std::str::FromStr;

pub mod cors;
pub mod jwt;
pub mod rate_limit;
pub mod server;
pub mod timeout;

pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;
pub use timeout::TimeoutConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ")]
    SharedSecret,
    #[error("access token lifetime must be shorter than refresh token lifetime")]
    TtlOrder,
    #[error("BOOTSTRAP_ADMIN_EMAIL and BOOTSTRAP_ADMIN_PASSWORD_HASH must be set together")]
    IncompleteBootstrap,
}

/// Account seeded into the in-memory account store at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password_hash: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Whole-process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub timeouts: TimeoutConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub server: ServerConfig,
    /// JSON role policy file; `None` selects the built-in policy.
    pub rbac_policy_path: Option<PathBuf>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bootstrap_admin = match (
            non_empty(&lookup, "BOOTSTRAP_ADMIN_EMAIL"),
            non_empty(&lookup, "BOOTSTRAP_ADMIN_PASSWORD_HASH"),
        ) {
            (Some(email), Some(password_hash)) => Some(BootstrapAdmin {
                email,
                password_hash,
            }),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteBootstrap),
        };

        Ok(Self {
            jwt: JwtConfig::from_lookup(&lookup)?,
            timeouts: TimeoutConfig::from_lookup(&lookup)?,
            cors: CorsConfig::from_lookup(&lookup),
            rate_limit: RateLimitConfig::from_lookup(&lookup)?,
            server: ServerConfig::from_lookup(&lookup)?,
            rbac_policy_path: non_empty(&lookup, "RBAC_POLICY_PATH").map(PathBuf::from),
            bootstrap_admin,
        })
    }
}

pub(crate) fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses `key` if set, else returns `default`. A set but unparseable value is an error.
pub(crate) fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match non_empty(lookup, key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;

    pub fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }
}
