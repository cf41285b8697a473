//! Workflow and dashboard configuration

use super::EnvLookup;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Dashboard refresh period in seconds
    /// Env: PDFDESK_DASHBOARD_POLL_SECS
    /// Default: 60
    pub dashboard_poll_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self { dashboard_poll_secs: 60 }
    }
}

impl WorkflowConfig {
    pub fn dashboard_poll_interval(&self) -> Duration {
        Duration::from_secs(self.dashboard_poll_secs)
    }

    pub fn merge(&mut self, other: Self) {
        self.dashboard_poll_secs = other.dashboard_poll_secs;
    }

    pub fn apply_env_vars(&mut self) {
        self.apply_env_with(&|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_env_with(&mut self, lookup: EnvLookup<'_>) {
        if let Some(secs) = lookup("PDFDESK_DASHBOARD_POLL_SECS") {
            if let Ok(s) = secs.parse() {
                self.dashboard_poll_secs = s;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.dashboard_poll_secs == 0 {
            bail!("Invalid dashboard_poll_secs: must be greater than 0");
        }
        Ok(())
    }
}
