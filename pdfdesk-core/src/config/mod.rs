//! Configuration system for Pdfdesk
//!
//! Values are resolved in the following order (highest priority wins):
//!
//! 1. **Environment Variables** - `PDFDESK_*` (plus `NEXT_PUBLIC_API_BASE_URL`)
//! 2. **Config File** (`pdfdesk.toml`) - Override defaults
//! 3. **Defaults** - Lowest priority
//!
//! # Example
//!
//! ```no_run
//! use pdfdesk_core::config::PdfdeskConfig;
//!
//! let config = PdfdeskConfig::load()?;
//! config.validate()?;
//! println!("backend: {}", config.api.base_url);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod api;
pub mod logging;
pub mod session;
pub mod workflow;

pub use api::ApiConfig;
pub use logging::LoggingConfig;
pub use session::SessionConfig;
pub use workflow::WorkflowConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "pdfdesk.toml";

/// Environment lookup used by `apply_env_*`
pub(crate) type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Complete Pdfdesk configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfdeskConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
    pub workflow: WorkflowConfig,
}

impl PdfdeskConfig {
    /// Load with the full supersedence chain from `pdfdesk.toml`
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from a specific file; a missing file means defaults
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = Self::default();

        if path.exists() {
            let file_config = Self::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.merge(file_config);
        }

        config.apply_env_vars();

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.as_ref().display()))
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.api.merge(other.api);
        self.session.merge(other.session);
        self.logging.merge(other.logging);
        self.workflow.merge(other.workflow);
    }

    /// Apply environment variables to configuration
    pub fn apply_env_vars(&mut self) {
        self.apply_env_with(&|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_env_with(&mut self, lookup: EnvLookup<'_>) {
        self.api.apply_env_with(lookup);
        self.session.apply_env_with(lookup);
        self.logging.apply_env_with(lookup);
        self.workflow.apply_env_with(lookup);
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;
        self.session.validate()?;
        self.logging.validate()?;
        self.workflow.validate()?;
        Ok(())
    }
}
