//! Generation mode selection
//!
//! The relay exposes two inbound endpoints that share one forwarding path.
//! The endpoint the caller picks decides the [`Mode`], and the mode decides
//! which upstream path receives the message:
//!
//! - Chat mode: plain conversational generation
//! - Tools mode: tool-augmented generation (the "file agent")

use colored::Colorize;
use std::fmt;

/// Selector between the plain-chat and tool-augmented upstream endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Plain chat: forwards to `/ollama/chat/stream`
    #[default]
    Chat,

    /// Tool-augmented generation: forwards to `/ollama/chat/stream/tools`
    Tools,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat => write!(f, "CHAT"),
            Self::Tools => write!(f, "TOOLS"),
        }
    }
}

impl Mode {
    /// Pick a mode from the caller's tools toggle
    ///
    /// # Examples
    ///
    /// ```
    /// use chat_relay::mode::Mode;
    ///
    /// assert_eq!(Mode::from_tools_enabled(true), Mode::Tools);
    /// assert_eq!(Mode::from_tools_enabled(false), Mode::Chat);
    /// ```
    pub fn from_tools_enabled(enabled: bool) -> Self {
        if enabled {
            Self::Tools
        } else {
            Self::Chat
        }
    }

    /// Parse a mode from a string ("chat" or "tools")
    ///
    /// # Examples
    ///
    /// ```
    /// use chat_relay::mode::Mode;
    ///
    /// assert_eq!(Mode::parse_str("TOOLS").unwrap(), Mode::Tools);
    /// assert!(Mode::parse_str("agent").is_err());
    /// ```
    pub fn parse_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "chat" => Ok(Self::Chat),
            "tools" => Ok(Self::Tools),
            other => Err(format!("Unknown mode: {}", other)),
        }
    }

    /// Upstream path appended to the configured base URL
    pub fn upstream_path(&self) -> &'static str {
        match self {
            Self::Chat => "/ollama/chat/stream",
            Self::Tools => "/ollama/chat/stream/tools",
        }
    }

    /// Inbound relay route serving this mode
    pub fn route(&self) -> &'static str {
        match self {
            Self::Chat => "/api/chat/stream",
            Self::Tools => "/api/chat/generate",
        }
    }

    /// Whether the relayed response carries `Cache-Control: no-cache` and
    /// `Connection: keep-alive`
    pub fn sets_keep_alive_headers(&self) -> bool {
        matches!(self, Self::Chat)
    }

    /// The other mode
    pub fn toggled(&self) -> Self {
        match self {
            Self::Chat => Self::Tools,
            Self::Tools => Self::Chat,
        }
    }

    /// Get a user-friendly description of this mode
    pub fn description(&self) -> &'static str {
        match self {
            Self::Chat => "Plain chat with the model",
            Self::Tools => "Tool-augmented generation (file agent)",
        }
    }

    /// Get a colored tag representation of this mode for the prompt
    pub fn colored_tag(&self) -> String {
        match self {
            Self::Chat => format!("[{}]", "CHAT".cyan()),
            Self::Tools => format!("[{}]", "TOOLS".purple()),
        }
    }
}
