//! Command-line interface definition for chat-relay
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands to run the relay server and the terminal chat client.

use clap::{Parser, Subcommand};

/// chat-relay - stream chat responses from a generation backend
///
/// Relays one free-text request at a time to the upstream generation
/// service and streams its response back as it is produced.
#[derive(Parser, Debug, Clone)]
#[command(name = "chat-relay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for chat-relay
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the relay HTTP server
    Serve {
        /// Address to listen on (e.g. 127.0.0.1:3000)
        #[arg(short, long)]
        bind: Option<String>,

        /// Base URL of the upstream generation service
        #[arg(short, long)]
        upstream: Option<String>,
    },

    /// Start an interactive chat session against a running relay
    Chat {
        /// Base URL of the relay server
        #[arg(short, long)]
        relay: Option<String>,

        /// Start with tool-augmented generation enabled
        #[arg(short, long)]
        tools: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_serve() {
        let cli = Cli::try_parse_from(["chat-relay", "serve"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve {
                bind: None,
                upstream: None
            }
        ));
    }

    #[test]
    fn test_cli_parse_serve_with_overrides() {
        let cli = Cli::try_parse_from([
            "chat-relay",
            "serve",
            "--bind",
            "0.0.0.0:8000",
            "--upstream",
            "http://backend:8080",
        ])
        .unwrap();
        if let Commands::Serve { bind, upstream } = cli.command {
            assert_eq!(bind.as_deref(), Some("0.0.0.0:8000"));
            assert_eq!(upstream.as_deref(), Some("http://backend:8080"));
        } else {
            panic!("Expected Serve command");
        }
    }

    #[test]
    fn test_cli_parse_chat_with_tools() {
        let cli = Cli::try_parse_from(["chat-relay", "chat", "--tools"]).unwrap();
        if let Commands::Chat { relay, tools } = cli.command {
            assert!(relay.is_none());
            assert!(tools);
        } else {
            panic!("Expected Chat command");
        }
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "chat-relay",
            "--verbose",
            "--config",
            "custom.yaml",
            "chat",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["chat-relay"]).is_err());
    }
}
