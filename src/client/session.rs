//! HTTP client side of the relay
//!
//! [`ChatClient`] runs one conversational turn: append the user's message,
//! POST it to the relay route for the chosen mode, and feed the streamed
//! response through a [`StreamConsumer`].

use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::client::consumer::StreamConsumer;
use crate::client::store::ConversationStore;
use crate::config::ClientConfig;
use crate::error::{Result, RelayError};
use crate::mode::Mode;
use crate::server::forwarder::{ChatRequest, ErrorEnvelope};

/// Client for a running relay server
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    relay_url: String,
    error_message: String,
}

impl ChatClient {
    /// Create a client from client configuration
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    ///
    /// # Examples
    ///
    /// ```
    /// use chat_relay::client::session::ChatClient;
    /// use chat_relay::config::ClientConfig;
    /// use chat_relay::mode::Mode;
    ///
    /// let client = ChatClient::new(&ClientConfig::default()).unwrap();
    /// assert_eq!(
    ///     client.endpoint(Mode::Tools),
    ///     "http://127.0.0.1:3000/api/chat/generate"
    /// );
    /// ```
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("chat-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RelayError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            relay_url: config.relay_url.trim_end_matches('/').to_string(),
            error_message: config.error_message.clone(),
        })
    }

    /// Relay URL for a mode
    pub fn endpoint(&self, mode: Mode) -> String {
        format!("{}{}", self.relay_url, mode.route())
    }

    /// Submit one message and stream the reply into `store`
    ///
    /// See [`ChatClient::submit_until_cancelled`].
    ///
    /// # Errors
    ///
    /// Same as [`ChatClient::submit_until_cancelled`]
    pub async fn submit(
        &self,
        store: &mut ConversationStore,
        input: &str,
        mode: Mode,
        on_delta: impl FnMut(&str),
    ) -> Result<String> {
        let never = CancellationToken::new();
        self.submit_until_cancelled(store, input, mode, &never, on_delta)
            .await
    }

    /// Submit one message and stream the reply into `store` until the
    /// stream ends or `cancel` fires
    ///
    /// Returns the assistant text received. Cancelling before the relay
    /// has answered ends the turn with no assistant message.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::EmptyInput`] or [`RelayError::Busy`] without
    /// touching the store. Any later failure (relay unreachable, error
    /// status, broken stream, invalid text) has already been recorded in
    /// the store as a terminal assistant message when it is returned.
    pub async fn submit_until_cancelled(
        &self,
        store: &mut ConversationStore,
        input: &str,
        mode: Mode,
        cancel: &CancellationToken,
        on_delta: impl FnMut(&str),
    ) -> Result<String> {
        store.append_user_message(input)?;

        let url = self.endpoint(mode);
        tracing::debug!("Submitting {} message to {}", mode, url);

        let request = self.client.post(&url).json(&ChatRequest {
            message: input.to_string(),
        });

        // The relay answers only once the upstream has produced a status,
        // so the wait for headers must also watch the token
        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Submission to {} cancelled before the reply started", url);
                store.complete_stream();
                return Ok(String::new());
            }
            sent = request.send() => sent,
        };

        let response = match sent {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Relay request to {} failed: {}", url, e);
                store.fail_stream(&self.error_message);
                return Err(
                    RelayError::UpstreamUnavailable(format!("relay unreachable: {}", e)).into(),
                );
            }
        };

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorEnvelope>()
                .await
                .map(|envelope| envelope.error)
                .unwrap_or_else(|_| status.to_string());
            tracing::warn!("Relay returned {}: {}", status, detail);
            store.fail_stream(&self.error_message);
            return Err(RelayError::UpstreamUnavailable(format!(
                "relay returned {}: {}",
                status, detail
            ))
            .into());
        }

        StreamConsumer::new(self.error_message.clone())
            .consume_until_cancelled(store, response.bytes_stream(), cancel, on_delta)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::store::Message;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ERROR_TEXT: &str = "Sorry, there was an error processing your request.";

    fn client_for(url: &str) -> ChatClient {
        ChatClient::new(&ClientConfig {
            relay_url: url.to_string(),
            error_message: ERROR_TEXT.to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_submit_posts_json_and_streams_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/stream"))
            .and(body_json(serde_json::json!({ "message": "hello" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(b"Hi there".to_vec(), "text/plain; charset=utf-8"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut store = ConversationStore::new();
        let text = client_for(&server.uri())
            .submit(&mut store, "hello", Mode::Chat, |_| {})
            .await
            .unwrap();

        assert_eq!(text, "Hi there");
        assert_eq!(
            store.messages(),
            &[Message::user("hello"), Message::assistant("Hi there")]
        );
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_submit_tools_mode_uses_generate_route() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("done"))
            .expect(1)
            .mount(&server)
            .await;

        let mut store = ConversationStore::new();
        client_for(&server.uri())
            .submit(&mut store, "list files", Mode::Tools, |_| {})
            .await
            .unwrap();
        assert_eq!(store.last(), Some(&Message::assistant("done")));
    }

    #[tokio::test]
    async fn test_cancel_while_waiting_for_reply_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("too late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let mut store = ConversationStore::new();
        let started = Instant::now();
        let text = client_for(&server.uri())
            .submit_until_cancelled(&mut store, "hello", Mode::Chat, &cancel, |_| {})
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(text, "");
        assert_eq!(store.messages(), &[Message::user("hello")]);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_submit_error_status_records_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(
                    serde_json::json!({ "error": "Failed to get response from AI" }),
                ),
            )
            .mount(&server)
            .await;

        let mut store = ConversationStore::new();
        let err = client_for(&server.uri())
            .submit(&mut store, "hello", Mode::Chat, |_| {})
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Failed to get response from AI"));
        assert_eq!(
            store.messages(),
            &[Message::user("hello"), Message::assistant(ERROR_TEXT)]
        );
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_submit_empty_reply_creates_no_assistant_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let mut store = ConversationStore::new();
        client_for(&server.uri())
            .submit(&mut store, "hello", Mode::Chat, |_| {})
            .await
            .unwrap();
        assert_eq!(store.messages(), &[Message::user("hello")]);
    }

    #[tokio::test]
    async fn test_submit_blank_input_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut store = ConversationStore::new();
        let err = client_for(&server.uri())
            .submit(&mut store, "   ", Mode::Chat, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RelayError>(),
            Some(RelayError::EmptyInput)
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_submit_while_loading_is_rejected() {
        let mut store = ConversationStore::new();
        store.append_user_message("in flight").unwrap();

        let err = client_for("http://127.0.0.1:9")
            .submit(&mut store, "second", Mode::Chat, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<RelayError>(), Some(RelayError::Busy)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_unreachable_relay_records_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut store = ConversationStore::new();
        let result = client_for(&format!("http://{}", addr))
            .submit(&mut store, "hello", Mode::Chat, |_| {})
            .await;

        assert!(result.is_err());
        assert_eq!(store.last(), Some(&Message::assistant(ERROR_TEXT)));
        assert!(!store.is_loading());
    }
}
