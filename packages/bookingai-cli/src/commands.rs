//! Slash command parsing for the chat prompt.

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Plain text for the assistant
    Message(String),
    /// Protect history with a passphrase
    Secure,
    /// Retry the passphrase for a locked history
    Unlock,
    /// Delete stored history
    Clear,
    /// Print the conversation
    History,
    /// Print mode, identity and storage details
    Status,
    /// Print the command list
    Help,
    /// Leave the client
    Quit,
    /// Blank line
    Empty,
    /// A slash command we do not know
    Unknown(String),
}

pub const HELP: &str = "\
Commands:
  /secure    protect your history with a passphrase
  /unlock    enter the passphrase for a locked history
  /clear     delete your stored history
  /history   show the conversation so far
  /status    show protection mode and storage details
  /help      show this list
  /quit      exit
Anything else is sent to the assistant.";

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Input::Empty;
        }

        let Some(command) = line.strip_prefix('/') else {
            return Input::Message(line.to_string());
        };

        match command.split_whitespace().next().unwrap_or("").to_lowercase().as_str() {
            "secure" => Input::Secure,
            "unlock" => Input::Unlock,
            "clear" => Input::Clear,
            "history" => Input::History,
            "status" => Input::Status,
            "help" | "?" => Input::Help,
            "quit" | "exit" | "q" => Input::Quit,
            other => Input::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Input::parse("/secure"), Input::Secure);
        assert_eq!(Input::parse("  /CLEAR  "), Input::Clear);
        assert_eq!(Input::parse("/exit"), Input::Quit);
        assert_eq!(Input::parse("/frobnicate now"), Input::Unknown("frobnicate".into()));
    }

    #[test]
    fn test_parse_messages() {
        assert_eq!(
            Input::parse(" Hotels in Tokyo? "),
            Input::Message("Hotels in Tokyo?".into())
        );
        assert_eq!(Input::parse("   "), Input::Empty);
    }
}
