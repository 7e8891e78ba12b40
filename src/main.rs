//! chat-relay - streaming chat relay
//!
#![doc = "chat-relay - streaming chat relay"]
#![doc = "Main entry point for the relay server and terminal chat client."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chat_relay::cli::{Cli, Commands};
use chat_relay::commands;
use chat_relay::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Serve { .. } => {
            tracing::info!("Starting relay server mode");
            commands::serve::run_serve(config).await?;
            Ok(())
        }
        Commands::Chat { tools, .. } => {
            tracing::info!("Starting interactive chat mode");
            if tools {
                tracing::debug!("Tool-augmented generation enabled at start");
            }

            // Moves `config` into the handler (match arms are exclusive)
            commands::chat::run_chat(config, tools).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins when set; otherwise `--verbose` raises the crate level
/// to debug.
fn init_tracing(verbose: bool, json_logs: bool) {
    let default_directive = if verbose {
        "chat_relay=debug"
    } else {
        "chat_relay=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
