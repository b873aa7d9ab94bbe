//! The dispatcher seam between a gateway session and the host.

use std::sync::Arc;

use async_trait::async_trait;

use crate::message::MessageEvent;

/// Receives inbound message events and distributes them to handlers.
///
/// Use `Arc<dyn Dispatcher>` to hand a dispatcher to the event loop.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Dispatches `event` to every registered handler.
    ///
    /// Returns once the event has been fully processed.
    async fn dispatch(&self, event: Arc<MessageEvent>);
}
