//! Logging configuration

use super::EnvLookup;
use crate::logging::{LogFormat, LogLevel, LogOutput};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Env: PDFDESK_LOG_LEVEL
    pub level: String,
    /// "human", "json" or "logfmt"
    /// Env: PDFDESK_LOG_FORMAT
    pub format: String,
    /// "stderr" or "stdout"
    /// Env: PDFDESK_LOG_OUTPUT
    pub output: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "human".to_string(), output: "stderr".to_string() }
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        self.apply_env_with(&|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_env_with(&mut self, lookup: EnvLookup<'_>) {
        if let Some(level) = lookup("PDFDESK_LOG_LEVEL") {
            self.level = level;
        }
        if let Some(format) = lookup("PDFDESK_LOG_FORMAT") {
            self.format = format;
        }
        if let Some(output) = lookup("PDFDESK_LOG_OUTPUT") {
            self.output = output;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.level.parse::<LogLevel>().is_err() {
            bail!("Invalid log level '{}': must be error, warn, info, debug or trace", self.level);
        }
        if self.format.parse::<LogFormat>().is_err() {
            bail!("Invalid log format '{}': must be human, json or logfmt", self.format);
        }
        if self.output.parse::<LogOutput>().is_err() {
            bail!("Invalid log output '{}': must be stderr or stdout", self.output);
        }
        Ok(())
    }

    /// Runtime logger configuration; invalid values fall back to defaults
    pub fn to_logging_config(&self) -> crate::logging::LoggingConfig {
        crate::logging::LoggingConfig::default()
            .with_level(self.level.parse().unwrap_or(LogLevel::Info))
            .with_format(self.format.parse().unwrap_or(LogFormat::Human))
            .with_output(self.output.parse().unwrap_or(LogOutput::Stderr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_reaches_runtime_config() {
        let mut config = LoggingConfig::default();
        assert_eq!(config.to_logging_config().output, LogOutput::Stderr);

        config.apply_env_with(&|key| (key == "PDFDESK_LOG_OUTPUT").then(|| "stdout".to_string()));
        assert!(config.validate().is_ok());
        assert_eq!(config.to_logging_config().output, LogOutput::Stdout);

        config.output = "syslog".into();
        assert!(config.validate().is_err());
    }
}
