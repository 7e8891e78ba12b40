//! Configuration management for chat-relay
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::cli::{Cli, Commands};
use crate::error::{Result, RelayError};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Main configuration structure for chat-relay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Relay server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream generation service settings
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Terminal chat client settings
    #[serde(default)]
    pub client: ClientConfig,
}

/// Relay server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the relay listens on
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Upstream generation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL the mode paths are appended to
    #[serde(default = "default_upstream_url")]
    pub base_url: String,

    /// Value sent in the `username` header on every upstream call
    #[serde(default = "default_caller_identity")]
    pub caller_identity: String,
}

fn default_upstream_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_caller_identity() -> String {
    "default-user".to_string()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_url(),
            caller_identity: default_caller_identity(),
        }
    }
}

/// Terminal chat client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the relay server
    #[serde(default = "default_relay_url")]
    pub relay_url: String,

    /// Assistant message shown when a stream fails
    #[serde(default = "default_error_message")]
    pub error_message: String,
}

fn default_relay_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

pub(crate) fn default_error_message() -> String {
    "Sorry, there was an error processing your request.".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            error_message: default_error_message(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RelayError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| RelayError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        // API_URL is the conventional variable; the prefixed one wins when both are set
        if let Ok(url) = std::env::var("API_URL") {
            self.upstream.base_url = url;
        }

        if let Ok(url) = std::env::var("CHAT_RELAY_UPSTREAM_URL") {
            self.upstream.base_url = url;
        }

        if let Ok(identity) = std::env::var("CHAT_RELAY_CALLER_IDENTITY") {
            self.upstream.caller_identity = identity;
        }

        if let Ok(bind) = std::env::var("CHAT_RELAY_BIND") {
            self.server.bind_address = bind;
        }

        if let Ok(relay_url) = std::env::var("CHAT_RELAY_URL") {
            self.client.relay_url = relay_url;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Serve { bind, upstream } => {
                if let Some(bind) = bind {
                    self.server.bind_address = bind.clone();
                }
                if let Some(upstream) = upstream {
                    self.upstream.base_url = upstream.clone();
                }
            }
            Commands::Chat { relay, .. } => {
                if let Some(relay) = relay {
                    self.client.relay_url = relay.clone();
                }
            }
        }
    }

    /// Parsed listen address
    ///
    /// # Errors
    ///
    /// Returns error if `server.bind_address` is not a socket address
    pub fn bind_address(&self) -> Result<SocketAddr> {
        self.server.bind_address.parse().map_err(|e| {
            RelayError::Config(format!(
                "Invalid bind address '{}': {}",
                self.server.bind_address, e
            ))
            .into()
        })
    }

    /// Validate the configuration
    ///
    /// The upstream base URL is only checked for presence; its shape is the
    /// deployment's concern.
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.upstream.base_url.trim().is_empty() {
            return Err(
                RelayError::Config("upstream.base_url cannot be empty".to_string()).into(),
            );
        }

        if self.upstream.caller_identity.is_empty() {
            return Err(RelayError::Config(
                "upstream.caller_identity cannot be empty".to_string(),
            )
            .into());
        }

        if reqwest::header::HeaderValue::from_str(&self.upstream.caller_identity).is_err() {
            return Err(RelayError::Config(format!(
                "upstream.caller_identity is not a valid header value: {:?}",
                self.upstream.caller_identity
            ))
            .into());
        }

        self.bind_address()?;

        url::Url::parse(&self.client.relay_url).map_err(|e| {
            RelayError::Config(format!(
                "Invalid client.relay_url '{}': {}",
                self.client.relay_url, e
            ))
        })?;

        Ok(())
    }
}
