//! Account lookup collaborator used by login.
//!
//! Persistence is outside this service; [`AccountStore`] is the seam a database-backed
//! implementation plugs into. Failures are opaque `anyhow` errors and get classified on the
//! way out of the handler.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::model::Account;

pub trait AccountStore: Send + Sync {
    /// Looks up an account by lowercased email.
    fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Account>>;

    /// Increments the consecutive failure counter and returns the new value.
    fn record_failed_login(&self, id: Uuid) -> anyhow::Result<u32>;

    /// Resets the failure counter and stamps the login time.
    fn record_successful_login(&self, id: Uuid, at: DateTime<Utc>) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        Self {
            accounts: RwLock::new(accounts.into_iter().map(|a| (a.id, a)).collect()),
        }
    }

    pub fn insert(&self, account: Account) -> anyhow::Result<()> {
        self.accounts
            .write()
            .map_err(|_| anyhow!("account store lock poisoned"))?
            .insert(account.id, account);
        Ok(())
    }
}

impl AccountStore for InMemoryAccountStore {
    fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Account>> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| anyhow!("account store lock poisoned"))?;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    fn record_failed_login(&self, id: Uuid) -> anyhow::Result<u32> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| anyhow!("account store lock poisoned"))?;
        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| anyhow!("account {id} not found"))?;
        account.failed_attempts = account.failed_attempts.saturating_add(1);
        Ok(account.failed_attempts)
    }

    fn record_successful_login(&self, id: Uuid, at: DateTime<Utc>) -> anyhow::Result<()> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| anyhow!("account store lock poisoned"))?;
        let account = accounts
            .get_mut(&id)
            .ok_or_else(|| anyhow!("account {id} not found"))?;
        account.failed_attempts = 0;
        account.last_login_at = Some(at);
        Ok(())
    }
}
