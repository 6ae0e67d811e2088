//! Per-client token buckets.
//!
//! Clients are keyed by the IP resolved into the request scope. An exhausted bucket
//! registers a retryable `RATE_LIMIT_EXCEEDED` whose `retry_after` is the limiter's wait time
//! rounded up to whole seconds.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use contacthub_config::RateLimitConfig;
use contacthub_core::AppError;
use governor::{DefaultKeyedRateLimiter, RateLimiter, clock::Clock};

use crate::metrics;
use crate::middleware::context::{RequestScope, UNKNOWN_IP};
use crate::security_event;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitScope {
    General,
    Auth,
}

impl RateLimitScope {
    pub const fn as_str(self) -> &'static str {
        match self {
            RateLimitScope::General => "general",
            RateLimitScope::Auth => "auth",
        }
    }
}

pub struct RateLimiters {
    general: DefaultKeyedRateLimiter<String>,
    auth: DefaultKeyedRateLimiter<String>,
}

impl std::fmt::Debug for RateLimiters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiters")
            .field("general_keys", &self.general.len())
            .field("auth_keys", &self.auth.len())
            .finish()
    }
}

impl RateLimiters {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            general: RateLimiter::keyed(config.general_quota()),
            auth: RateLimiter::keyed(config.auth_quota()),
        }
    }

    fn limiter(&self, scope: RateLimitScope) -> &DefaultKeyedRateLimiter<String> {
        match scope {
            RateLimitScope::General => &self.general,
            RateLimitScope::Auth => &self.auth,
        }
    }

    /// Takes one cell for `key`; on exhaustion returns how long until the next one.
    pub fn check(&self, scope: RateLimitScope, key: &str) -> Result<(), Duration> {
        let limiter = self.limiter(scope);
        limiter
            .check_key(&key.to_string())
            .map_err(|not_until| not_until.wait_time_from(limiter.clock().now()))
    }

    /// Drops buckets that have fully replenished.
    pub fn retain_recent(&self) {
        self.general.retain_recent();
        self.auth.retain_recent();
    }
}

/// State for [`rate_limit`].
#[derive(Debug, Clone)]
pub struct RateLimitGate {
    pub limiters: Arc<RateLimiters>,
    pub scope: RateLimitScope,
}

impl RateLimitGate {
    pub fn new(limiters: Arc<RateLimiters>, scope: RateLimitScope) -> Self {
        Self { limiters, scope }
    }
}

/// Whole seconds, rounded up, never below one.
pub fn retry_after(wait: Duration) -> Duration {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    Duration::from_secs(secs.max(1))
}

pub async fn rate_limit(
    State(gate): State<RateLimitGate>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let scope = req.extensions().get::<Arc<RequestScope>>().cloned();
    let ip = scope
        .as_ref()
        .map(|s| s.ip.clone())
        .unwrap_or_else(|| UNKNOWN_IP.to_string());

    if let Err(wait) = gate.limiters.check(gate.scope, &ip) {
        let path = scope.as_ref().map(|s| s.path.as_str()).unwrap_or_default();
        security_event!(
            "rate_limited",
            scope = gate.scope.as_str(),
            ip = %ip,
            path,
            wait_ms = wait.as_millis() as u64,
            "Client exceeded rate limit"
        );
        metrics::track_rate_limited(gate.scope.as_str());
        return Err(AppError::rate_limited(retry_after(wait)));
    }

    Ok(next.run(req).await)
}
