//! Outbound client for the upstream generation service
//!
//! [`UpstreamClient`] issues exactly one POST per relayed request. The user's
//! message travels as a raw `text/plain` body, and the configured caller
//! identity rides in the `username` header. No timeout and no retry are
//! applied: a generation may legitimately stream for a long time.

use crate::config::UpstreamConfig;
use crate::error::{Result, RelayError};
use crate::mode::Mode;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};

/// Header carrying the caller identity upstream
pub const IDENTITY_HEADER: &str = "username";

/// HTTP client bound to one upstream base URL and caller identity
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
    caller_identity: HeaderValue,
}

impl UpstreamClient {
    /// Create a client from upstream configuration
    ///
    /// # Errors
    ///
    /// Returns error if the caller identity is not a valid header value or
    /// the HTTP client cannot be built
    ///
    /// # Examples
    ///
    /// ```
    /// use chat_relay::config::UpstreamConfig;
    /// use chat_relay::mode::Mode;
    /// use chat_relay::upstream::UpstreamClient;
    ///
    /// let client = UpstreamClient::new(&UpstreamConfig::default()).unwrap();
    /// assert_eq!(
    ///     client.endpoint(Mode::Tools),
    ///     "http://localhost:8080/ollama/chat/stream/tools"
    /// );
    /// ```
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let caller_identity = HeaderValue::from_str(&config.caller_identity).map_err(|e| {
            RelayError::Config(format!("Invalid caller identity header value: {}", e))
        })?;

        let client = Client::builder()
            .user_agent(concat!("chat-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RelayError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized upstream client: base_url={}, identity={}",
            config.base_url,
            config.caller_identity
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            caller_identity,
        })
    }

    /// Full upstream URL for a mode
    pub fn endpoint(&self, mode: Mode) -> String {
        format!("{}{}", self.base_url, mode.upstream_path())
    }

    /// Send a message upstream and return the response once its status is known
    ///
    /// The body has not been read when this returns; the caller decides
    /// whether to relay it.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::UpstreamUnavailable`] on network failure, on a
    /// non-success status, or on a status that cannot carry a body
    pub async fn send(&self, mode: Mode, message: &str) -> Result<Response> {
        let url = self.endpoint(mode);
        tracing::debug!("Forwarding {} bytes to {}", message.len(), url);

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "text/plain")
            .header(IDENTITY_HEADER, self.caller_identity.clone())
            .body(message.to_owned())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Upstream request to {} failed: {}", url, e);
                RelayError::UpstreamUnavailable(format!("request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Upstream {} returned status {}", url, status);
            return Err(RelayError::UpstreamUnavailable(format!(
                "upstream returned status {}",
                status
            ))
            .into());
        }

        if !has_body(status) {
            tracing::warn!("Upstream {} returned no body (status {})", url, status);
            return Err(RelayError::UpstreamUnavailable(format!(
                "upstream returned no body (status {})",
                status
            ))
            .into());
        }

        Ok(response)
    }
}

/// Success statuses that by definition carry no response body
fn has_body(status: StatusCode) -> bool {
    !matches!(
        status,
        StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT | StatusCode::NOT_MODIFIED
    )
}
