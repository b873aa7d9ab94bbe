//! Inbound message model.
//!
//! A [`MessageEvent`] is read-only to the host. Handlers receive it together
//! with its tokenized content (see [`tokenize`]).

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

// ============================================================================
// User
// ============================================================================

/// A user known to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    /// Opaque user identifier.
    pub id: String,
    /// Display name, when the gateway supplied one.
    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    /// Creates a user with no display name.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
        }
    }

    /// Sets the display name (builder pattern).
    pub fn with_username(mut self, name: impl Into<String>) -> Self {
        self.username = Some(name.into());
        self
    }

    /// Renders the user as an inline mention, `<@id>`.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

impl Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.username {
            Some(name) => write!(f, "{name} ({})", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

// ============================================================================
// Channel
// ============================================================================

/// A channel known to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Opaque channel identifier.
    pub id: String,
    /// Channel name, when known.
    #[serde(default)]
    pub name: Option<String>,
}

impl Channel {
    /// Creates a channel with no name.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    /// Renders the channel as an inline mention, `<#id>`.
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }
}

// ============================================================================
// MessageEvent
// ============================================================================

/// An inbound message delivered by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Message identifier.
    pub id: String,
    /// Author of the message.
    pub author: User,
    /// Channel the message was posted in.
    pub channel_id: String,
    /// Guild (server) the channel belongs to; `None` for direct messages.
    #[serde(default)]
    pub guild_id: Option<String>,
    /// Raw text content.
    #[serde(default)]
    pub content: String,
    /// Users explicitly mentioned in the message.
    #[serde(default)]
    pub mentions: Vec<User>,
}

impl MessageEvent {
    /// Creates a direct message (no guild) with no mentions.
    pub fn direct(
        id: impl Into<String>,
        author: User,
        channel_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author,
            channel_id: channel_id.into(),
            guild_id: None,
            content: content.into(),
            mentions: Vec::new(),
        }
    }

    /// Places the message in a guild (builder pattern).
    pub fn in_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    /// Adds a mentioned user (builder pattern).
    pub fn mentioning(mut self, user: User) -> Self {
        self.mentions.push(user);
        self
    }

    /// Returns `true` when the message arrived outside any guild.
    ///
    /// An empty guild id is treated the same as an absent one.
    pub fn is_direct(&self) -> bool {
        self.guild_id.as_deref().is_none_or(str::is_empty)
    }

    /// Splits the content into tokens. See [`tokenize`].
    pub fn tokens(&self) -> Vec<String> {
        tokenize(&self.content)
    }
}

/// Splits message content on single spaces.
///
/// Repeated spaces are not collapsed: `"!op  1"` yields `["!op", "", "1"]`.
/// Empty content yields a single empty token.
pub fn tokenize(content: &str) -> Vec<String> {
    content.split(' ').map(str::to_string).collect()
}
