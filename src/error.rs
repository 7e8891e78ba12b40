//! Error types for chat-relay
//!
//! This module defines all error types used throughout the relay server and
//! the streaming client, using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for chat-relay operations
///
/// Every error is scoped to a single in-flight request; nothing here is
/// treated as process-fatal except configuration errors at startup.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Inbound request body is missing, unparsable, or carries no message
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Upstream could not be reached, answered with a non-success status,
    /// or returned no body
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The relayed byte stream failed after reading started
    #[error("Stream read failure: {0}")]
    StreamRead(String),

    /// An incomplete multi-byte sequence remained when the stream ended
    #[error("Stream ended inside a multi-byte sequence ({pending} byte(s) pending)")]
    DecodeTruncation {
        /// Number of undecoded bytes left in the buffer
        pending: usize,
    },

    /// The stream carried a byte sequence that is not valid UTF-8
    #[error("Invalid UTF-8 in stream at byte offset {offset}")]
    Decode {
        /// Offset of the invalid sequence, counted from the start of the stream
        offset: usize,
    },

    /// A submission arrived while a previous stream is still open
    #[error("A response is still streaming; wait for it to finish")]
    Busy,

    /// Submitted input was blank
    #[error("Message cannot be empty")]
    EmptyInput,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for chat-relay operations
///
/// Uses `anyhow::Error` so callers can attach context; handlers that need
/// to map failures onto HTTP responses downcast to [`RelayError`].
pub type Result<T> = anyhow::Result<T>;
