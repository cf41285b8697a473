//! Session persistence configuration

use super::EnvLookup;
use crate::session::{FileSessionStore, SessionHandle};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Where the signed-in session is stored between invocations
    /// Env: PDFDESK_SESSION_PATH
    /// Default: ".pdfdesk/session.json"
    pub path: String,

    /// Persist the session to `path`; false keeps it in memory only
    /// Env: PDFDESK_SESSION_PERSIST
    /// Default: true
    pub persist: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { path: ".pdfdesk/session.json".to_string(), persist: true }
    }
}

impl SessionConfig {
    /// Build the session handle this configuration describes
    pub fn handle(&self) -> SessionHandle {
        if self.persist {
            SessionHandle::new(FileSessionStore::new(&self.path))
        } else {
            SessionHandle::in_memory()
        }
    }

    pub fn merge(&mut self, other: Self) {
        self.path = other.path;
        self.persist = other.persist;
    }

    pub fn apply_env_vars(&mut self) {
        self.apply_env_with(&|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_env_with(&mut self, lookup: EnvLookup<'_>) {
        if let Some(path) = lookup("PDFDESK_SESSION_PATH") {
            self.path = path;
        }

        if let Some(persist) = lookup("PDFDESK_SESSION_PERSIST") {
            self.persist = persist.parse().unwrap_or(true);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.persist && self.path.trim().is_empty() {
            bail!("Invalid session path: must not be empty when persist is enabled");
        }
        Ok(())
    }
}
