use std::sync::Arc;

use anyhow::bail;
use contacthub_auth::{InMemoryRevocationStore, PolicyError, RolePolicy, TokenService};
use contacthub_config::AppConfig;
use contacthub_core::permissions::ROLE_ADMIN;

use crate::middleware::rate_limit::RateLimiters;
use crate::modules::auth::model::Account;
use crate::modules::auth::store::{AccountStore, InMemoryAccountStore};

/// Everything handlers and middleware share. Built once at startup, read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub policy: Arc<RolePolicy>,
    pub tokens: Arc<TokenService>,
    pub accounts: Arc<dyn AccountStore>,
    pub limiters: Arc<RateLimiters>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Loads the role policy and wires the token service to it.
    pub fn new(config: AppConfig, accounts: Arc<dyn AccountStore>) -> Result<Self, PolicyError> {
        let policy = Arc::new(RolePolicy::load(config.rbac_policy_path.as_deref())?);
        let tokens = Arc::new(TokenService::new(
            config.jwt.clone(),
            policy.clone(),
            Arc::new(InMemoryRevocationStore::new()),
        ));
        let limiters = Arc::new(RateLimiters::new(&config.rate_limit));

        Ok(Self {
            config: Arc::new(config),
            policy,
            tokens,
            accounts,
            limiters,
        })
    }
}

/// Production state: in-memory accounts seeded with the bootstrap admin, if configured.
pub fn init_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let accounts = InMemoryAccountStore::new();
    if let Some(admin) = &config.bootstrap_admin {
        accounts.insert(Account::new(
            &admin.email,
            "Administrator",
            ROLE_ADMIN,
            admin.password_hash.clone(),
        ))?;
    }

    let state = AppState::new(config, Arc::new(accounts))?;
    if state.config.bootstrap_admin.is_some() && !state.policy.is_known_role(ROLE_ADMIN) {
        bail!("bootstrap admin configured but the role policy has no `{ROLE_ADMIN}` role");
    }

    tracing::info!(
        roles = state.policy.roles().count(),
        bootstrap_admin = state.config.bootstrap_admin.is_some(),
        "Application state initialized"
    );
    Ok(state)
}
