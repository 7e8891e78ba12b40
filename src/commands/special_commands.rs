//! Special commands parser for the interactive chat client
//!
//! Special commands let the user toggle tool-augmented generation, inspect
//! the session, and leave. They are prefixed with `/` and are
//! case-insensitive; everything else is sent to the relay as a message.

use crate::mode::Mode;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Flip between chat and tools mode
    ToggleTools,

    /// Switch to a specific mode
    SwitchMode(Mode),

    /// Display the current mode
    ShowMode,

    /// Print the whole conversation so far
    History,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; send the input as a message
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns [`CommandError::UnknownCommand`] if the input starts with `/`
/// but is not a known command, and [`CommandError::UnsupportedArgument`]
/// for `/mode` with an unknown mode name.
///
/// # Examples
///
/// ```
/// use chat_relay::commands::special_commands::{parse_special_command, SpecialCommand};
/// use chat_relay::mode::Mode;
///
/// assert_eq!(parse_special_command("/tools").unwrap(), SpecialCommand::ToggleTools);
/// assert_eq!(
///     parse_special_command("/mode chat").unwrap(),
///     SpecialCommand::SwitchMode(Mode::Chat)
/// );
/// assert_eq!(parse_special_command("hello").unwrap(), SpecialCommand::None);
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    match lower.as_str() {
        "/tools" => Ok(SpecialCommand::ToggleTools),
        "/mode" => Ok(SpecialCommand::ShowMode),
        input if input.starts_with("/mode ") => {
            let arg = input[6..].trim();
            Mode::parse_str(arg)
                .map(SpecialCommand::SwitchMode)
                .map_err(|_| CommandError::UnsupportedArgument {
                    command: "/mode".to_string(),
                    arg: arg.to_string(),
                })
        }
        "/history" => Ok(SpecialCommand::History),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" | "exit" | "quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print help for the special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

MODE:
  /tools          - Toggle tool-augmented generation (file agent) on or off
  /mode           - Show the current mode
  /mode chat      - Switch to plain chat
  /mode tools     - Switch to tool-augmented generation

SESSION:
  /history        - Print the conversation so far
  /help           - Show this help
  /exit, exit     - Leave the session

Press Ctrl+C while a reply is streaming to stop it.
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(
            parse_special_command("what is rust?").unwrap(),
            SpecialCommand::None
        );
    }

    #[test]
    fn test_toggle_tools() {
        assert_eq!(
            parse_special_command("/TOOLS").unwrap(),
            SpecialCommand::ToggleTools
        );
    }

    #[test]
    fn test_mode_without_argument_shows_mode() {
        assert_eq!(parse_special_command("/mode").unwrap(), SpecialCommand::ShowMode);
    }

    #[test]
    fn test_mode_switch() {
        assert_eq!(
            parse_special_command("/mode tools").unwrap(),
            SpecialCommand::SwitchMode(Mode::Tools)
        );
        assert_eq!(
            parse_special_command("  /mode   chat ").unwrap(),
            SpecialCommand::SwitchMode(Mode::Chat)
        );
    }

    #[test]
    fn test_mode_invalid_argument() {
        let err = parse_special_command("/mode write").unwrap_err();
        assert_eq!(
            err,
            CommandError::UnsupportedArgument {
                command: "/mode".to_string(),
                arg: "write".to_string(),
            }
        );
    }

    #[test]
    fn test_exit_aliases() {
        for input in ["/exit", "/quit", "exit", "QUIT"] {
            assert_eq!(parse_special_command(input).unwrap(), SpecialCommand::Exit);
        }
    }

    #[test]
    fn test_history_and_help() {
        assert_eq!(parse_special_command("/history").unwrap(), SpecialCommand::History);
        assert_eq!(parse_special_command("/?").unwrap(), SpecialCommand::Help);
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_special_command("/models").unwrap_err();
        assert!(err.to_string().contains("Unknown command: /models"));
    }
}
