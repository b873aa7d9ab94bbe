//! Per-message context handed to handlers.

use std::sync::Arc;

use discbot_core::{BoxedGateway, GatewayResult, MessageEvent};

/// Everything a handler sees for one inbound message.
///
/// One `MessageContext` is built per dispatch and shared (via `Arc`) by every
/// handler in the chain and by the command interpreter.
pub struct MessageContext {
    event: Arc<MessageEvent>,
    args: Vec<String>,
    gateway: BoxedGateway,
}

impl MessageContext {
    /// Creates a context, tokenizing the event content.
    pub fn new(event: Arc<MessageEvent>, gateway: BoxedGateway) -> Self {
        let args = event.tokens();
        Self {
            event,
            args,
            gateway,
        }
    }

    /// The inbound event.
    pub fn event(&self) -> &MessageEvent {
        &self.event
    }

    /// The tokenized content. Index 0 is the command word.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The first token, or `""` for empty content.
    pub fn command(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or_default()
    }

    /// The outbound gateway handle.
    pub fn gateway(&self) -> &BoxedGateway {
        &self.gateway
    }

    /// Sends `text` to the channel the message came from.
    pub async fn reply(&self, text: &str) -> GatewayResult<String> {
        self.gateway.send(&self.event.channel_id, text).await
    }
}

impl std::fmt::Debug for MessageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageContext")
            .field("event", &self.event)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}
