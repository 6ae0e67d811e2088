//! Role to permission policy.
//!
//! Loaded once at startup (built-in table or a JSON file) and read-only afterwards. Every
//! role name and permission is validated when the policy is built. Lookups for roles that
//! are not in the table deny.
//!
//! File format:
//!
//! ```json
//! {
//!   "admin": ["*"],
//!   "sales_rep": ["contacts:read", "contacts:update"]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use contacthub_core::permissions::{
    self, CONTENT_WRITER_PERMISSIONS, EDITOR_PERMISSIONS, HR_MANAGER_PERMISSIONS, WILDCARD,
};

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("failed to read role policy {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("role policy is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("role policy defines no roles")]
    Empty,
    #[error("invalid role name {0:?}: expected lowercase letters and underscores")]
    InvalidRole(String),
    #[error("role {role:?} has invalid permission {permission:?}: expected \"*\" or \"resource:action\"")]
    InvalidPermission { role: String, permission: String },
}

/// Immutable role → permission table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RolePolicy {
    roles: BTreeMap<String, BTreeSet<String>>,
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RolePolicy {
    /// The built-in ContactHub roles.
    pub fn builtin() -> Self {
        let table: [(&str, &[&str]); 4] = [
            (permissions::ROLE_ADMIN, &[WILDCARD]),
            (permissions::ROLE_HR_MANAGER, HR_MANAGER_PERMISSIONS),
            (permissions::ROLE_EDITOR, EDITOR_PERMISSIONS),
            (permissions::ROLE_CONTENT_WRITER, CONTENT_WRITER_PERMISSIONS),
        ];

        let roles = table
            .into_iter()
            .map(|(role, perms)| {
                (
                    role.to_string(),
                    perms.iter().map(|p| p.to_string()).collect(),
                )
            })
            .collect();

        Self { roles }
    }

    /// Builds a policy from an explicit table, rejecting malformed entries.
    pub fn from_map<I, P>(table: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = (String, P)>,
        P: IntoIterator<Item = String>,
    {
        let mut roles = BTreeMap::new();

        for (role, perms) in table {
            if !permissions::is_valid_role_name(&role) {
                return Err(PolicyError::InvalidRole(role));
            }

            let mut set = BTreeSet::new();
            for permission in perms {
                if !permissions::is_valid_permission(&permission) {
                    return Err(PolicyError::InvalidPermission { role, permission });
                }
                set.insert(permission);
            }
            roles.insert(role, set);
        }

        if roles.is_empty() {
            return Err(PolicyError::Empty);
        }

        Ok(Self { roles })
    }

    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let table: BTreeMap<String, Vec<String>> = serde_json::from_str(json)?;
        Self::from_map(table)
    }

    pub fn from_file(path: &Path) -> Result<Self, PolicyError> {
        let json = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Loads `path` if given, otherwise the built-in policy.
    pub fn load(path: Option<&Path>) -> Result<Self, PolicyError> {
        match path {
            Some(path) => {
                let policy = Self::from_file(path)?;
                tracing::info!(
                    path = %path.display(),
                    roles = policy.roles.len(),
                    "Loaded role policy from file"
                );
                Ok(policy)
            }
            None => Ok(Self::builtin()),
        }
    }

    /// Membership test. `*` grants everything; unknown roles get nothing.
    pub fn has_permission(&self, role: &str, permission: &str) -> bool {
        self.roles
            .get(role)
            .is_some_and(|perms| perms.contains(WILDCARD) || perms.contains(permission))
    }

    pub fn is_known_role(&self, role: &str) -> bool {
        self.roles.contains_key(role)
    }

    /// Permissions of `role`, sorted. Empty for unknown roles.
    pub fn permissions_for(&self, role: &str) -> Vec<String> {
        self.roles
            .get(role)
            .map(|perms| perms.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }
}
