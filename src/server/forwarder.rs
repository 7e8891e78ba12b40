//! Inbound request handling shared by both relay endpoints
//!
//! A request is validated before anything leaves the process: the body
//! must be JSON carrying a non-empty `message` string. The upstream call is
//! then made and its status checked; only a successful, body-bearing reply
//! is handed to the relay. Everything that fails before the first byte is
//! streamed becomes a JSON error envelope.

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RelayError};
use crate::mode::Mode;
use crate::server::relay;
use crate::upstream::UpstreamClient;

/// Error text returned when the upstream cannot serve the request
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Failed to get response from AI";

/// Error text returned when the request body is unusable
pub const MALFORMED_REQUEST_MESSAGE: &str = "Invalid request body";

/// Error text returned when the relay response cannot be assembled
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Inbound request payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    /// The user's free-text message
    pub message: String,
}

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorEnvelope {
    /// Human-readable failure description
    pub error: String,
}

impl ErrorEnvelope {
    fn response(status: StatusCode, message: &str) -> Response {
        (
            status,
            Json(ErrorEnvelope {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

/// Extract the user message from a raw request body
///
/// # Errors
///
/// Returns [`RelayError::MalformedRequest`] if the body is absent, is not
/// a JSON object with a string `message`, or the message is empty
///
/// # Examples
///
/// ```
/// use chat_relay::server::forwarder::parse_request;
///
/// assert_eq!(parse_request(br#"{"message":"hello"}"#).unwrap(), "hello");
/// assert!(parse_request(b"").is_err());
/// ```
pub fn parse_request(body: &[u8]) -> Result<String> {
    if body.is_empty() {
        return Err(RelayError::MalformedRequest("request body is empty".to_string()).into());
    }

    let request: ChatRequest = serde_json::from_slice(body)
        .map_err(|e| RelayError::MalformedRequest(format!("invalid JSON: {}", e)))?;

    if request.message.is_empty() {
        return Err(RelayError::MalformedRequest("message is empty".to_string()).into());
    }

    Ok(request.message)
}

/// Forward one inbound request to the upstream endpoint chosen by `mode`
///
/// Always produces a response: a streaming 200 on success, otherwise a
/// JSON error envelope (400 for malformed input, 500 for upstream failure).
pub async fn forward(upstream: &UpstreamClient, mode: Mode, body: Bytes) -> Response {
    let message = match parse_request(&body) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!("Rejected {} request: {}", mode, e);
            return ErrorEnvelope::response(StatusCode::BAD_REQUEST, MALFORMED_REQUEST_MESSAGE);
        }
    };

    tracing::info!("Relaying {} request ({} bytes)", mode, message.len());

    let response = match upstream.send(mode, &message).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Error in {} route: {}", mode, e);
            return ErrorEnvelope::response(
                StatusCode::INTERNAL_SERVER_ERROR,
                UPSTREAM_FAILURE_MESSAGE,
            );
        }
    };

    relay::relay(mode, response).unwrap_or_else(|e| {
        tracing::error!("Failed to build {} relay response: {}", mode, e);
        ErrorEnvelope::response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    })
}
