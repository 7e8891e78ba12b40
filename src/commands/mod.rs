/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes two top-level command modules:

- `serve` — Run the relay HTTP server
- `chat`  — Interactive terminal client against a running relay

These handlers are intentionally small and use the library components:
the server router, the chat client, and the conversation store.
*/

use crate::client::{ChatClient, ConversationStore, Role};
use crate::config::Config;
use crate::error::{Result, RelayError};
use crate::mode::Mode;

// Special commands parser for the chat session
pub mod special_commands;

// Relay server command handler
pub mod serve {
    //! Relay server handler.
    //!
    //! Validates configuration and runs the axum server until the process
    //! receives Ctrl+C.

    use super::*;

    /// Run the relay server
    ///
    /// # Errors
    ///
    /// Returns error if the server cannot bind or fails while running
    pub async fn run_serve(config: Config) -> Result<()> {
        tracing::info!("Starting relay server");

        tokio::select! {
            result = crate::server::serve(&config) => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
        }
    }
}

// Chat command handler
pub mod chat {
    //! Interactive chat handler.
    //!
    //! Runs a readline loop; each line is either a special command or a
    //! message submitted to the relay, whose reply is printed as it streams.

    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::io::Write;
    use tokio_util::sync::CancellationToken;

    /// Start the interactive chat session
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `tools` - Start with tool-augmented generation enabled
    pub async fn run_chat(config: Config, tools: bool) -> Result<()> {
        tracing::info!("Starting interactive chat against {}", config.client.relay_url);

        let client = ChatClient::new(&config.client)?;
        let mut store = ConversationStore::new();
        let mut mode = Mode::from_tools_enabled(tools);
        let mut rl = DefaultEditor::new().map_err(|e| {
            RelayError::Config(format!("Failed to initialize line editor: {}", e))
        })?;

        print_welcome_banner(&mode, &config.client.relay_url);

        loop {
            let prompt = format!("{} >> ", mode.colored_tag());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::ToggleTools) => {
                            mode = mode.toggled();
                            println!("Switched to {} mode: {}\n", mode, mode.description());
                            continue;
                        }
                        Ok(SpecialCommand::SwitchMode(new_mode)) => {
                            mode = new_mode;
                            println!("Switched to {} mode: {}\n", mode, mode.description());
                            continue;
                        }
                        Ok(SpecialCommand::ShowMode) => {
                            println!("Current mode: {} ({})\n", mode, mode.description());
                            continue;
                        }
                        Ok(SpecialCommand::History) => {
                            print_history(&store);
                            continue;
                        }
                        Ok(SpecialCommand::Help) => {
                            print_help();
                            continue;
                        }
                        Ok(SpecialCommand::Exit) => break,
                        Ok(SpecialCommand::None) => {}
                        Err(e) => {
                            eprintln!("{}\n", e.to_string().yellow());
                            continue;
                        }
                    }

                    if let Err(e) = rl.add_history_entry(line.as_str()) {
                        tracing::debug!("Failed to add history entry: {}", e);
                    }

                    // Send the line as typed; blank checks use the trimmed form
                    submit_turn(&client, &mut store, &line, mode).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("Interrupted. Type /exit to leave.");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    tracing::error!("Readline error: {}", e);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Submit one message, printing the reply as it arrives
    ///
    /// Ctrl+C while waiting for or streaming the reply stops it and keeps
    /// what was received.
    async fn submit_turn(
        client: &ChatClient,
        store: &mut ConversationStore,
        input: &str,
        mode: Mode,
    ) {
        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        let mut printed_any = false;
        let result = client
            .submit_until_cancelled(store, input, mode, &cancel, |delta| {
                if !printed_any {
                    print!("{} ", "assistant>".green());
                    printed_any = true;
                }
                print!("{}", delta);
                let _ = std::io::stdout().flush();
            })
            .await;
        watcher.abort();

        if printed_any {
            println!();
        }

        match result {
            Ok(_) if cancel.is_cancelled() => println!("{}", "(stopped)".dimmed()),
            Ok(text) if text.is_empty() => println!("{}", "(no response)".dimmed()),
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Turn failed: {}", e);
                if let Some(RelayError::Busy | RelayError::EmptyInput) =
                    e.downcast_ref::<RelayError>()
                {
                    eprintln!("{}", e.to_string().yellow());
                } else if let Some(last) = store.last() {
                    println!("{} {}", "assistant>".red(), last.content);
                }
            }
        }
        println!();
    }

    fn print_welcome_banner(mode: &Mode, relay_url: &str) {
        println!("{}", "chat-relay interactive session".bold());
        println!("Relay: {}", relay_url);
        println!("Mode:  {} ({})", mode, mode.description());
        println!("Type /help for commands, /exit to leave.\n");
    }

    fn print_history(store: &ConversationStore) {
        if store.is_empty() {
            println!("(no messages yet)\n");
            return;
        }
        for message in store.messages() {
            let tag = match message.role {
                Role::User => format!("{}>", message.role).cyan(),
                Role::Assistant => format!("{}>", message.role).green(),
            };
            println!("{} {}", tag, message.content);
        }
        println!();
    }
}
