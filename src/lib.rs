//! chat-relay - streaming chat relay library
//!
//! This library provides a small HTTP relay that forwards one free-text chat
//! message at a time to an upstream generation service and streams the
//! response back, plus the client-side pieces that turn that byte stream
//! into a growing conversation.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `server`: axum routes, request parsing, and the streaming relay
//! - `upstream`: HTTP client for the generation service
//! - `client`: UTF-8 stream decoding, conversation store, and stream consumer
//! - `mode`: plain chat versus tool-augmented generation
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use chat_relay::{client::ConversationStore, ChatClient, Config, Mode};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let client = ChatClient::new(&config.client)?;
//!     let mut store = ConversationStore::new();
//!     client
//!         .submit(&mut store, "hello", Mode::Chat, |delta| print!("{}", delta))
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod mode;
pub mod server;
pub mod upstream;

// Re-export commonly used types
pub use client::{ChatClient, ConversationStore, StreamConsumer};
pub use config::Config;
pub use error::{RelayError, Result};
pub use mode::Mode;
pub use upstream::UpstreamClient;
