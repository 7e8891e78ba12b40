//! Conversation state for one client session
//!
//! [`ConversationStore`] is the ordered message list plus the single
//! loading flag that serializes submissions. All mutation goes through the
//! transition methods below; at most one assistant message is open at a
//! time, and when open it is always the last message.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, RelayError};

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing
    User,
    /// The generation backend
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single conversation entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message
    pub role: Role,
    /// Message text
    pub content: String,
}

impl Message {
    /// Create a user message
    ///
    /// # Examples
    ///
    /// ```
    /// use chat_relay::client::store::{Message, Role};
    ///
    /// let msg = Message::user("hello");
    /// assert_eq!(msg.role, Role::User);
    /// assert_eq!(msg.content, "hello");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered conversation plus the in-flight request flag
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    /// Index of the assistant message still receiving text
    open_assistant: Option<usize>,
    loading: bool,
}

impl ConversationStore {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages in display order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation has no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Last message, if any
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Whether a request is in flight
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The assistant message currently receiving text
    pub fn open_assistant_message(&self) -> Option<&Message> {
        self.open_assistant.and_then(|idx| self.messages.get(idx))
    }

    /// Append the user's message and mark a request as in flight
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::EmptyInput`] for blank input and
    /// [`RelayError::Busy`] while a previous stream is still open. Neither
    /// case modifies the conversation.
    ///
    /// # Examples
    ///
    /// ```
    /// use chat_relay::client::store::ConversationStore;
    ///
    /// let mut store = ConversationStore::new();
    /// store.append_user_message("hello").unwrap();
    /// assert!(store.is_loading());
    /// assert!(store.append_user_message("again").is_err());
    /// ```
    pub fn append_user_message(&mut self, content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(RelayError::EmptyInput.into());
        }
        if self.loading {
            return Err(RelayError::Busy.into());
        }

        self.messages.push(Message::user(content));
        self.loading = true;
        Ok(())
    }

    /// Create the assistant message for the current stream
    ///
    /// The new message becomes the open one; a previously open assistant
    /// message is left as it is and no longer receives text.
    pub fn begin_assistant_message(&mut self, content: &str) {
        self.messages.push(Message::assistant(content));
        self.open_assistant = Some(self.messages.len() - 1);
    }

    /// Overwrite the open assistant message with the accumulated text
    ///
    /// Does nothing if no assistant message is open.
    pub fn append_to_assistant_message(&mut self, accumulated: &str) {
        if let Some(message) = self
            .open_assistant
            .and_then(|idx| self.messages.get_mut(idx))
        {
            message.content.clear();
            message.content.push_str(accumulated);
        }
    }

    /// Close the stream normally
    pub fn complete_stream(&mut self) {
        self.open_assistant = None;
        self.loading = false;
    }

    /// Close the stream after a failure
    ///
    /// The open assistant message (if any) keeps the text received so far,
    /// and a single terminal assistant message carrying `error_message` is
    /// appended after it.
    pub fn fail_stream(&mut self, error_message: &str) {
        self.open_assistant = None;
        self.messages.push(Message::assistant(error_message));
        self.loading = false;
    }
}
