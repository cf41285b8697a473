//! Backend API configuration

use super::EnvLookup;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every resource path is joined onto
    /// Env: PDFDESK_API_BASE_URL, falling back to NEXT_PUBLIC_API_BASE_URL
    /// Default: "http://localhost:8000/api"
    pub base_url: String,

    /// Per-request timeout in seconds; unset means no client-side timeout
    /// Env: PDFDESK_API_TIMEOUT_SECS
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: "http://localhost:8000/api".to_string(), timeout_secs: None }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn merge(&mut self, other: Self) {
        self.base_url = other.base_url;
        self.timeout_secs = other.timeout_secs.or(self.timeout_secs);
    }

    pub fn apply_env_vars(&mut self) {
        self.apply_env_with(&|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_env_with(&mut self, lookup: EnvLookup<'_>) {
        if let Some(url) =
            lookup("PDFDESK_API_BASE_URL").or_else(|| lookup("NEXT_PUBLIC_API_BASE_URL"))
        {
            self.base_url = url;
        }

        if let Some(timeout) = lookup("PDFDESK_API_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.timeout_secs = Some(t);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            bail!("Invalid base_url: must start with http:// or https://");
        }

        if self.timeout_secs == Some(0) {
            bail!("Invalid timeout_secs: must be greater than 0");
        }

        Ok(())
    }
}
