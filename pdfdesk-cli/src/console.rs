//! Terminal implementations of the confirm and notify hooks

use dialoguer::{Confirm as ConfirmPrompt, Password};
use pdfdesk_core::notify::{Confirm, Notice, Notifier, Severity};

/// Interactive yes/no prompt defaulting to no
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        accepted(ConfirmPrompt::new().with_prompt(prompt).default(false).interact())
    }
}

/// A prompt that could not be shown (no terminal, interrupted) declines
fn accepted(answer: dialoguer::Result<bool>) -> bool {
    match answer {
        Ok(yes) => yes,
        Err(err) => {
            log::debug!("Confirmation prompt failed: {}", err);
            false
        }
    }
}

pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Success | Severity::Info => println!("{}", notice.message),
            Severity::Warning | Severity::Error => eprintln!("{}: {}", notice.title, notice.message),
        }
    }
}

/// Password typed without echo
pub fn read_password() -> anyhow::Result<String> {
    Ok(Password::new().with_prompt("Password").interact()?)
}

/// Left-aligned table with a header row
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| {
        let padded: Vec<String> =
            cells.iter().zip(&widths).map(|(cell, w)| format!("{:<width$}", cell, width = *w)).collect();
        println!("{}", padded.join("  ").trim_end());
    };

    line(headers.to_vec());
    for row in rows {
        line(row.iter().map(String::as_str).collect());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;

    #[test]
    fn test_failed_prompt_declines() {
        assert!(accepted(Ok(true)));
        assert!(!accepted(Ok(false)));
        assert!(!accepted(Err(dialoguer::Error::IO(io::Error::other("not a terminal")))));
    }
}
