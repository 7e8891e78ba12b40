//! Client-side stream consumption
//!
//! - `decoder`: incremental UTF-8 decoding across chunk boundaries
//! - `store`: the conversation and its loading flag
//! - `consumer`: the stream-to-message state machine
//! - `session`: HTTP client that drives one turn against the relay

pub mod consumer;
pub mod decoder;
pub mod session;
pub mod store;

pub use consumer::{ConsumerState, StreamConsumer};
pub use decoder::Utf8StreamDecoder;
pub use session::ChatClient;
pub use store::{ConversationStore, Message, Role};
