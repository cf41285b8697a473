//! User-facing notices and confirmations
//!
//! Mutations report their outcome through a [`Notifier`] exactly once:
//! [`guarded`] runs the mutation, logs a failure and turns it into a single
//! error notice. Destructive operations ask a [`Confirm`] first and do
//! nothing when it declines.

use crate::error::ApiError;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(severity: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { severity, title: title.into(), message: message.into() }
    }
}

/// Sink for transient notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    fn success(&self, message: &str) {
        self.notify(Notice::new(Severity::Success, "Success", message));
    }

    fn error(&self, message: &str) {
        self.notify(Notice::new(Severity::Error, "Error", message));
    }
}

/// Writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Success | Severity::Info => log::info!("{}: {}", notice.title, notice.message),
            Severity::Warning => log::warn!("{}: {}", notice.title, notice.message),
            Severity::Error => log::error!("{}: {}", notice.title, notice.message),
        }
    }
}

/// Keeps every notice; used by tests and the CLI summary
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner).last().cloned()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices().into_iter().map(|n| n.message).collect()
    }

    pub fn clear(&self) {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner).push(notice);
    }
}

/// Confirmation step in front of destructive actions
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

/// Ask `confirm`, failing with [`ApiError::Cancelled`] when declined
pub fn require_confirmation(confirm: &dyn Confirm, prompt: &str) -> crate::Result<()> {
    if confirm.confirm(prompt) {
        Ok(())
    } else {
        log::debug!("Declined: {}", prompt);
        Err(ApiError::Cancelled)
    }
}

/// Run a mutation and report it with exactly one notice.
///
/// A declined confirmation is silent. Validation failures report their
/// first message; other failures report `failure`. Nothing is retried.
pub async fn guarded<T, F>(
    notifier: &dyn Notifier,
    success: &str,
    failure: &str,
    mutation: F,
) -> Option<T>
where
    F: Future<Output = crate::Result<T>>,
{
    match mutation.await {
        Ok(value) => {
            notifier.success(success);
            Some(value)
        }
        Err(ApiError::Cancelled) => None,
        Err(e) => {
            log::error!("{}: {}", failure, e);
            notifier.error(&e.user_message(failure));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guarded_reports_once() {
        let notifier = RecordingNotifier::new();

        let value = guarded(&notifier, "Saved", "Failed to save", async { Ok(7) }).await;
        assert_eq!(value, Some(7));
        assert_eq!(notifier.last().unwrap().severity, Severity::Success);

        notifier.clear();
        let value: Option<()> = guarded(&notifier, "Saved", "Failed to save", async {
            Err(ApiError::Network("reset".into()))
        })
        .await;
        assert_eq!(value, None);
        assert_eq!(notifier.notices().len(), 1);
        assert_eq!(notifier.last().unwrap().severity, Severity::Error);
    }

    #[tokio::test]
    async fn test_cancelled_is_silent() {
        let notifier = RecordingNotifier::new();
        let value: Option<()> =
            guarded(&notifier, "Deleted", "Failed to delete", async { Err(ApiError::Cancelled) }).await;
        assert_eq!(value, None);
        assert!(notifier.notices().is_empty());
    }

    #[test]
    fn test_require_confirmation() {
        assert!(require_confirmation(&AlwaysConfirm, "Delete?").is_ok());
        assert!(matches!(require_confirmation(&NeverConfirm, "Delete?"), Err(ApiError::Cancelled)));
    }
}
