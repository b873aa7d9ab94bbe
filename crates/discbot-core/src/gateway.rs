//! Gateway capability interface.
//!
//! The host never talks to the chat network directly. Everything it needs
//! from the outside world goes through the narrow [`Gateway`] trait, and
//! inbound messages arrive on the event stream of a [`GatewaySession`].
//!
//! ```text
//! Connector ──connect(token)──▶ GatewaySession { gateway, events }
//!                                     │              │
//!                   outbound calls ◀──┘              └──▶ Dispatcher
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::GatewayResult;
use crate::message::{Channel, MessageEvent, User};

/// Outbound capabilities of a live gateway session.
///
/// Every method may block on network I/O. Implementations decide their own
/// retry policy; callers in the host absorb failures and log them.
#[async_trait]
pub trait Gateway: Send + Sync + 'static {
    /// Returns the user id the bot is logged in as.
    fn current_user_id(&self) -> &str;

    /// Sends `text` to a channel, returning the new message id.
    async fn send(&self, channel_id: &str, text: &str) -> GatewayResult<String>;

    /// Deletes a message from a channel.
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> GatewayResult<()>;

    /// Looks up a user by id.
    ///
    /// Fails with [`GatewayError::NotFound`](crate::GatewayError::NotFound)
    /// when the id is unknown.
    async fn resolve_user(&self, user_id: &str) -> GatewayResult<User>;

    /// Looks up a channel by raw id.
    async fn resolve_channel(&self, channel_id: &str) -> GatewayResult<Channel>;

    /// Opens (or reuses) a private channel with a user and returns its id.
    async fn open_direct_channel(&self, user_id: &str) -> GatewayResult<String>;

    /// Terminates the live session.
    async fn close(&self) -> GatewayResult<()>;
}

/// A shared gateway trait object.
pub type BoxedGateway = Arc<dyn Gateway>;

/// An open session: the outbound handle plus the inbound event stream.
pub struct GatewaySession {
    /// Outbound capabilities.
    pub gateway: BoxedGateway,
    /// Inbound message events, in delivery order.
    pub events: mpsc::Receiver<MessageEvent>,
}

impl std::fmt::Debug for GatewaySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewaySession")
            .field("user_id", &self.gateway.current_user_id())
            .finish_non_exhaustive()
    }
}

/// Opens authenticated gateway sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Authenticates with `token` and opens a session.
    async fn connect(&self, token: &str) -> GatewayResult<GatewaySession>;
}
