//! Error types shared by gateway implementations and the host.
//!
//! Framework-level errors (extension loading) live in `discbot-framework`,
//! configuration errors in `discbot-runtime`.

use thiserror::Error;

// =============================================================================
// Gateway Errors
// =============================================================================

/// Errors returned by outbound [`Gateway`](crate::gateway::Gateway) calls.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The user, channel or message identifier does not resolve.
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// What was being resolved ("user", "channel", ...).
        kind: &'static str,
        /// The identifier that failed to resolve.
        id: String,
    },

    /// The session is not connected.
    #[error("gateway is not connected")]
    NotConnected,

    /// The session has already been closed.
    #[error("gateway session closed")]
    Closed,

    /// Sending a message or action failed.
    #[error("failed to send: {0}")]
    SendFailed(String),

    /// Authentication with the gateway failed.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl GatewayError {
    /// Creates a not-found error for a user identifier.
    pub fn user_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "user",
            id: id.into(),
        }
    }

    /// Creates a not-found error for a channel identifier.
    pub fn channel_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "channel",
            id: id.into(),
        }
    }

    /// Returns `true` for resolution failures, which callers absorb silently.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
