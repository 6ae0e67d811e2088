//! # ContactHub CLI
//!
//! Operator helpers behind the `contacthub-cli` binary: minting credentials for a subject,
//! validating a role policy file before deployment and decoding tokens for support.
//!
//! ```ignore
//! use contacthub_cli::{issue_token, load_service};
//!
//! let service = load_service()?;
//! let pair = issue_token(&service, None, "ops@contacthub.io", "admin")?;
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use contacthub_auth::{
    CredentialPair, InMemoryRevocationStore, RolePolicy, TokenService, inspect_token,
};
use contacthub_config::AppConfig;

/// Builds a token service from the process environment, including the configured policy.
pub fn load_service() -> Result<TokenService> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    let policy = RolePolicy::load(config.rbac_policy_path.as_deref())
        .context("failed to load role policy")?;

    Ok(TokenService::new(
        config.jwt,
        Arc::new(policy),
        Arc::new(InMemoryRevocationStore::new()),
    ))
}

/// Issues a pair for `email`/`role`. A random subject id is generated when none is given.
pub fn issue_token(
    service: &TokenService,
    subject: Option<&str>,
    email: &str,
    role: &str,
) -> Result<CredentialPair> {
    let subject = subject
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    service
        .issue_pair(&subject, email, role)
        .with_context(|| format!("cannot issue credentials for role {role:?}"))
}

/// Validates a policy file and renders one `role: permissions` line per role.
pub fn check_policy(path: &Path) -> Result<Vec<String>> {
    let policy = RolePolicy::from_file(path)?;
    Ok(policy
        .roles()
        .map(|role| format!("{role}: {}", policy.permissions_for(role).join(", ")))
        .collect())
}

/// Human-readable dump of a token's header and claims. The signature is not verified.
pub fn describe_token(token: &str) -> Result<String> {
    let (header, claims) = inspect_token(token).context("token could not be decoded")?;

    let fmt_ts = |ts: i64| {
        DateTime::<Utc>::from_timestamp(ts, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| ts.to_string())
    };
    let state = if claims.exp <= Utc::now().timestamp() {
        "expired"
    } else {
        "not expired"
    };

    Ok(format!(
        "alg:     {:?}\nsubject: {}\nemail:   {}\nrole:    {}\nissuer:  {}\njti:     {}\nissued:  {}\nexpires: {} ({state})",
        header.alg,
        claims.sub,
        claims.email,
        claims.role,
        claims.iss,
        claims.jti,
        fmt_ts(claims.iat),
        fmt_ts(claims.exp),
    ))
}
