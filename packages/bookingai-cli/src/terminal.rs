//! Terminal implementation of the passphrase and confirmation prompts.

use std::io::{self, Write};

use async_trait::async_trait;
use bookingai_core::{ConfirmAction, PassphrasePurpose, UserPrompt};

/// Prompts on the controlling terminal
///
/// Passphrases are read without echo. An empty entry or a read error counts
/// as cancelling.
pub struct TerminalPrompt;

fn passphrase_label(purpose: PassphrasePurpose) -> &'static str {
    match purpose {
        PassphrasePurpose::Unlock => "Passphrase to unlock your chat history (empty to skip): ",
        PassphrasePurpose::Create => "New passphrase for your chat history: ",
        PassphrasePurpose::Confirm => "Confirm passphrase: ",
    }
}

fn confirm_label(action: ConfirmAction) -> &'static str {
    match action {
        ConfirmAction::ClearHistory => "Delete your stored chat history? This cannot be undone. [y/N] ",
    }
}

/// Read one line from stdin on the blocking pool; `None` at end of input
pub async fn read_line() -> io::Result<Option<String>> {
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        match io::stdin().read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    })
    .await
    .map_err(io::Error::other)?
}

#[async_trait]
impl UserPrompt for TerminalPrompt {
    async fn request_passphrase(&self, purpose: PassphrasePurpose) -> Option<String> {
        let label = passphrase_label(purpose);
        let result = tokio::task::spawn_blocking(move || rpassword::prompt_password(label)).await;

        match result {
            Ok(Ok(passphrase)) if purpose == PassphrasePurpose::Unlock && passphrase.is_empty() => None,
            Ok(Ok(passphrase)) => Some(passphrase),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Could not read passphrase");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Passphrase prompt task failed");
                None
            }
        }
    }

    async fn confirm(&self, action: ConfirmAction) -> bool {
        print!("{}", confirm_label(action));
        let _ = io::stdout().flush();

        match read_line().await {
            Ok(Some(answer)) => is_yes(&answer),
            _ => false,
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }
}
