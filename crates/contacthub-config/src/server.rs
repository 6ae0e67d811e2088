use std::net::SocketAddr;
use std::path::PathBuf;

use crate::{ConfigError, non_empty, parse_or};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub metrics_addr: SocketAddr,
    pub log_dir: PathBuf,
    /// Prometheus recorder and `/metrics` listener (`OBSERVABILITY_ENABLED`, default true).
    pub observability_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            metrics_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
            log_dir: PathBuf::from("storage/logs"),
            observability_enabled: true,
        }
    }
}

impl ServerConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            addr: parse_or(lookup, "SERVER_ADDR", defaults.addr)?,
            metrics_addr: parse_or(lookup, "METRICS_ADDR", defaults.metrics_addr)?,
            log_dir: non_empty(lookup, "LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            observability_enabled: parse_or(
                lookup,
                "OBSERVABILITY_ENABLED",
                defaults.observability_enabled,
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::lookup;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(&lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr.port(), 3000);
        assert!(config.observability_enabled);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(&lookup(&[
            ("SERVER_ADDR", "127.0.0.1:8080"),
            ("OBSERVABILITY_ENABLED", "false"),
            ("LOG_DIR", "/var/log/contacthub"),
        ]))
        .unwrap();
        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
        assert!(!config.observability_enabled);
        assert_eq!(config.log_dir, PathBuf::from("/var/log/contacthub"));
    }

    #[test]
    fn test_bad_address() {
        let err = ServerConfig::from_lookup(&lookup(&[("SERVER_ADDR", "localhost")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SERVER_ADDR", .. }));
    }
}
