//! Log entries and their output formats

use crate::logging::{LogLevel, LoggingConfig};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

/// A structured log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Usually the module path
    pub target: String,
    pub fields: BTreeMap<String, Value>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: String, target: String) -> Self {
        Self { timestamp: Utc::now(), level, message, target, fields: BTreeMap::new() }
    }

    pub fn from_log_record(record: &log::Record, config: &LoggingConfig) -> Self {
        let mut entry =
            Self::new(record.level().into(), record.args().to_string(), record.target().to_string());
        for (key, value) in &config.context_fields {
            entry.fields.insert(key.clone(), Value::String(value.clone()));
        }
        entry
    }

    fn level_label(&self) -> String {
        format!("{:?}", self.level).to_uppercase()
    }
}

/// How logs should be formatted
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// {"timestamp":"2024-01-15T10:30:00Z","level":"INFO","message":"Template uploaded"}
    Json,
    /// 2024-01-15 10:30:00.000 INFO  [pdfdesk_core::registry] Template uploaded
    Human,
    /// timestamp=2024-01-15T10:30:00Z level=INFO target=... message="Template uploaded"
    Logfmt,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "human" | "text" => Ok(LogFormat::Human),
            "logfmt" => Ok(LogFormat::Logfmt),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

impl LogFormat {
    pub fn format_entry(&self, entry: &LogEntry) -> String {
        match self {
            LogFormat::Json => format_json(entry),
            LogFormat::Human => format_human(entry),
            LogFormat::Logfmt => format_logfmt(entry),
        }
    }
}

fn format_json(entry: &LogEntry) -> String {
    let mut json = serde_json::Map::new();
    json.insert("timestamp".to_string(), Value::String(entry.timestamp.to_rfc3339()));
    json.insert("level".to_string(), Value::String(entry.level_label()));
    json.insert("message".to_string(), Value::String(entry.message.clone()));
    json.insert("target".to_string(), Value::String(entry.target.clone()));
    for (key, value) in &entry.fields {
        json.insert(key.clone(), value.clone());
    }

    serde_json::to_string(&json).unwrap_or_else(|_| "Failed to serialize log entry".to_string())
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_human(entry: &LogEntry) -> String {
    let mut message = format!(
        "{} {:5} [{}] {}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        entry.level_label(),
        entry.target,
        entry.message
    );
    for (key, value) in &entry.fields {
        message.push_str(&format!(" {}={}", key, plain(value)));
    }
    message
}

fn format_logfmt(entry: &LogEntry) -> String {
    let mut parts = vec![
        format!("timestamp={}", entry.timestamp.to_rfc3339()),
        format!("level={}", entry.level_label()),
        format!("target={}", entry.target),
        format!("message=\"{}\"", entry.message.replace('"', "\\\"")),
    ];
    for (key, value) in &entry.fields {
        parts.push(format!("{}=\"{}\"", key, plain(value).replace('"', "\\\"")));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> LogEntry {
        let mut entry = LogEntry::new(
            LogLevel::Info,
            "Template \"FNA\" uploaded".into(),
            "pdfdesk_core::registry".into(),
        );
        entry.fields.insert("service".into(), Value::String("cli".into()));
        entry
    }

    #[test]
    fn test_json_format() {
        let line = LogFormat::Json.format_entry(&entry());
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["service"], "cli");
        assert_eq!(parsed["target"], "pdfdesk_core::registry");
    }

    #[test]
    fn test_human_and_logfmt() {
        let human = LogFormat::Human.format_entry(&entry());
        assert!(human.contains("INFO  [pdfdesk_core::registry] Template \"FNA\" uploaded service=cli"));

        let logfmt = LogFormat::Logfmt.format_entry(&entry());
        assert!(logfmt.contains("message=\"Template \\\"FNA\\\" uploaded\""));
        assert!(logfmt.ends_with("service=\"cli\""));
    }
}
