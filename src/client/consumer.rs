//! Projection of a relayed byte stream onto the conversation
//!
//! [`StreamConsumer`] is a small state machine:
//!
//! ```text
//! AwaitingFirstChunk --(non-empty text)--> Accumulating --(end)--> Done
//!         |                                     |
//!         +---------------(end)-----------------+--> Done
//! ```
//!
//! The assistant message is created on the first chunk that decodes to
//! non-empty text and then overwritten in place with the running
//! accumulator. An empty stream never creates an assistant message. Read
//! and decode failures close the stream through
//! [`ConversationStore::fail_stream`], which appends one terminal error
//! message.

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::client::decoder::Utf8StreamDecoder;
use crate::client::store::ConversationStore;
use crate::error::{Result, RelayError};

/// Consumer state for one stream session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    /// No text has been decoded yet; no assistant message exists
    AwaitingFirstChunk,
    /// The assistant message exists and grows with each chunk
    Accumulating,
    /// The stream ended, failed, or was cancelled
    Done,
}

/// Per-request stream session state
#[derive(Debug)]
pub struct StreamConsumer {
    state: ConsumerState,
    decoder: Utf8StreamDecoder,
    accumulator: String,
    error_message: String,
}

impl Default for StreamConsumer {
    fn default() -> Self {
        Self::new(crate::config::default_error_message())
    }
}

impl StreamConsumer {
    /// Create a consumer that reports failures with `error_message`
    pub fn new(error_message: impl Into<String>) -> Self {
        Self {
            state: ConsumerState::AwaitingFirstChunk,
            decoder: Utf8StreamDecoder::new(),
            accumulator: String::new(),
            error_message: error_message.into(),
        }
    }

    /// Current state
    pub fn state(&self) -> ConsumerState {
        self.state
    }

    /// Text decoded so far
    pub fn accumulated(&self) -> &str {
        &self.accumulator
    }

    /// Feed one chunk, returning the text it added
    ///
    /// # Errors
    ///
    /// Returns a decode error if the chunk contains invalid UTF-8. The
    /// store is not touched in that case; callers close the stream with
    /// [`StreamConsumer::fail`].
    ///
    /// # Examples
    ///
    /// ```
    /// use chat_relay::client::consumer::{ConsumerState, StreamConsumer};
    /// use chat_relay::client::store::ConversationStore;
    ///
    /// let mut store = ConversationStore::new();
    /// store.append_user_message("hello").unwrap();
    ///
    /// let mut consumer = StreamConsumer::default();
    /// consumer.on_chunk(&mut store, b"Hi").unwrap();
    /// consumer.on_chunk(&mut store, b" there").unwrap();
    /// consumer.finish(&mut store).unwrap();
    ///
    /// assert_eq!(consumer.state(), ConsumerState::Done);
    /// assert_eq!(store.last().unwrap().content, "Hi there");
    /// ```
    pub fn on_chunk(&mut self, store: &mut ConversationStore, chunk: &[u8]) -> Result<String> {
        if self.state == ConsumerState::Done {
            return Ok(String::new());
        }

        let text = self.decoder.decode(chunk)?;
        self.apply(store, &text);
        Ok(text)
    }

    /// End of stream: flush the decoder and close the stream
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::DecodeTruncation`] if the stream ended inside
    /// a multi-byte sequence; the stream is then closed as failed.
    pub fn finish(&mut self, store: &mut ConversationStore) -> Result<()> {
        if self.state == ConsumerState::Done {
            return Ok(());
        }

        match std::mem::take(&mut self.decoder).finish() {
            Ok(tail) => {
                self.apply(store, &tail);
                tracing::debug!(
                    "Stream completed: {} chars, assistant message {}",
                    self.accumulator.chars().count(),
                    if self.state == ConsumerState::Accumulating {
                        "created"
                    } else {
                        "not created"
                    }
                );
                store.complete_stream();
                self.state = ConsumerState::Done;
                Ok(())
            }
            Err(e) => {
                self.fail(store, &e);
                Err(e)
            }
        }
    }

    /// Close the stream as failed
    pub fn fail(&mut self, store: &mut ConversationStore, error: &anyhow::Error) {
        if self.state == ConsumerState::Done {
            return;
        }
        tracing::warn!(
            "Stream failed after {} bytes of text: {}",
            self.accumulator.len(),
            error
        );
        store.fail_stream(&self.error_message);
        self.state = ConsumerState::Done;
    }

    /// Stop reading and keep exactly the text decoded so far
    ///
    /// Bytes of an incomplete trailing sequence are discarded, since they
    /// never formed a character.
    pub fn cancel(&mut self, store: &mut ConversationStore) {
        if self.state == ConsumerState::Done {
            return;
        }
        tracing::debug!(
            "Stream cancelled after {} bytes of text ({} undecoded bytes dropped)",
            self.accumulator.len(),
            self.decoder.pending_len()
        );
        store.complete_stream();
        self.state = ConsumerState::Done;
    }

    /// Consume a byte stream to completion
    ///
    /// `on_delta` sees each non-empty piece of newly decoded text in order.
    ///
    /// # Errors
    ///
    /// Returns the read or decode error that ended the stream; the failure
    /// has already been recorded in `store`.
    pub async fn consume<S, B, E>(
        self,
        store: &mut ConversationStore,
        stream: S,
        on_delta: impl FnMut(&str),
    ) -> Result<String>
    where
        S: Stream<Item = std::result::Result<B, E>>,
        B: AsRef<[u8]>,
        E: std::fmt::Display,
    {
        let never = CancellationToken::new();
        self.consume_until_cancelled(store, stream, &never, on_delta)
            .await
    }

    /// Consume a byte stream until it ends or `cancel` fires
    ///
    /// On cancellation the assistant message holds exactly the text
    /// decoded before the cancellation, and the accumulated text is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns the read or decode error that ended the stream; the failure
    /// has already been recorded in `store`.
    pub async fn consume_until_cancelled<S, B, E>(
        mut self,
        store: &mut ConversationStore,
        stream: S,
        cancel: &CancellationToken,
        mut on_delta: impl FnMut(&str),
    ) -> Result<String>
    where
        S: Stream<Item = std::result::Result<B, E>>,
        B: AsRef<[u8]>,
        E: std::fmt::Display,
    {
        tokio::pin!(stream);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.cancel(store);
                    return Ok(self.accumulator);
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(chunk)) => match self.on_chunk(store, chunk.as_ref()) {
                    Ok(delta) => {
                        if !delta.is_empty() {
                            on_delta(&delta);
                        }
                    }
                    Err(e) => {
                        self.fail(store, &e);
                        return Err(e);
                    }
                },
                Some(Err(e)) => {
                    let err: anyhow::Error = RelayError::StreamRead(e.to_string()).into();
                    self.fail(store, &err);
                    return Err(err);
                }
                None => break,
            }
        }

        self.finish(store)?;
        Ok(self.accumulator)
    }

    fn apply(&mut self, store: &mut ConversationStore, text: &str) {
        if text.is_empty() {
            return;
        }

        self.accumulator.push_str(text);
        match self.state {
            ConsumerState::AwaitingFirstChunk => {
                store.begin_assistant_message(&self.accumulator);
                self.state = ConsumerState::Accumulating;
                tracing::debug!("First chunk received, assistant message created");
            }
            ConsumerState::Accumulating => {
                store.append_to_assistant_message(&self.accumulator);
            }
            ConsumerState::Done => {}
        }
    }
}
