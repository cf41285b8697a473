//! Pdfdesk Logging
//!
//! A small structured logger built on the standard `log` crate. Configure it
//! once at startup, then use `log::info!` and friends everywhere.
//!
//! # Example
//!
//! ```rust,no_run
//! use pdfdesk_core::logging::{LoggingConfig, LogFormat};
//!
//! let config = LoggingConfig::production()
//!     .with_format(LogFormat::Json)
//!     .with_context_field("service", "pdfdesk-cli");
//!
//! pdfdesk_core::logging::init_logging(&config).unwrap();
//! log::info!("Loaded {} templates", 12);
//! ```

pub mod config;
pub mod formatter;

pub use config::{LogLevel, LogOutput, LoggingConfig};
pub use formatter::{LogEntry, LogFormat};

use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// Initialize the logging system
///
/// Safe to call multiple times; only the first call installs a logger.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let mut result = Ok(());
    INIT.call_once(|| {
        result = init_logging_internal(config);
    });
    result
}

fn init_logging_internal(config: &LoggingConfig) -> anyhow::Result<()> {
    let logger = PdfdeskLogger::new(config.clone());
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(log::Level::from(config.level.clone()).to_level_filter());
    Ok(())
}

struct PdfdeskLogger {
    config: LoggingConfig,
    writer: Arc<dyn LogWriter>,
}

impl PdfdeskLogger {
    fn new(config: LoggingConfig) -> Self {
        let writer: Arc<dyn LogWriter> = match config.output {
            LogOutput::Stdout => Arc::new(StdoutWriter { format: config.format.clone() }),
            LogOutput::Stderr => Arc::new(StderrWriter { format: config.format.clone() }),
        };
        Self { config, writer }
    }
}

impl log::Log for PdfdeskLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::from(self.config.level.clone())
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let entry = LogEntry::from_log_record(record, &self.config);
        let _ = self.writer.write_log(&entry);
    }

    fn flush(&self) {
        let _ = self.writer.flush();
    }
}

trait LogWriter: Send + Sync {
    fn write_log(&self, entry: &LogEntry) -> anyhow::Result<()>;
    fn flush(&self) -> anyhow::Result<()>;
}

struct StdoutWriter {
    format: LogFormat,
}

impl LogWriter for StdoutWriter {
    fn write_log(&self, entry: &LogEntry) -> anyhow::Result<()> {
        println!("{}", self.format.format_entry(entry));
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        use std::io::Write;
        std::io::stdout().flush()?;
        Ok(())
    }
}

struct StderrWriter {
    format: LogFormat,
}

impl LogWriter for StderrWriter {
    fn write_log(&self, entry: &LogEntry) -> anyhow::Result<()> {
        eprintln!("{}", self.format.format_entry(entry));
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        use std::io::Write;
        std::io::stderr().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    #[test]
    fn test_logger_respects_level() {
        let logger = PdfdeskLogger::new(LoggingConfig::default().with_level(LogLevel::Warn));
        let info = log::MetadataBuilder::new().level(log::Level::Info).build();
        let error = log::MetadataBuilder::new().level(log::Level::Error).build();

        assert!(!logger.enabled(&info));
        assert!(logger.enabled(&error));
    }
}
