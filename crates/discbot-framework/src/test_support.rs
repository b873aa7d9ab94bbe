//! In-memory gateway used by unit tests.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::context::MessageContext;
use discbot_core::{
    BoxedGateway, Channel, Gateway, GatewayError, GatewayResult, MessageEvent, User,
};

pub(crate) const BOT_ID: &str = "bot";

#[derive(Default)]
pub(crate) struct RecordingGateway {
    users: HashSet<String>,
    channels: HashSet<String>,
    dm_fails: bool,
    pub sent: Mutex<Vec<(String, String)>>,
    pub deleted: Mutex<Vec<(String, String)>>,
    pub closed: Mutex<usize>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(mut self, ids: &[&str]) -> Self {
        self.users.extend(ids.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_channels(mut self, ids: &[&str]) -> Self {
        self.channels.extend(ids.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_failing_dm(mut self) -> Self {
        self.dm_fails = true;
        self
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }

    pub fn close_count(&self) -> usize {
        *self.closed.lock()
    }
}

#[async_trait]
impl Gateway for RecordingGateway {
    fn current_user_id(&self) -> &str {
        BOT_ID
    }

    async fn send(&self, channel_id: &str, text: &str) -> GatewayResult<String> {
        let mut sent = self.sent.lock();
        sent.push((channel_id.to_string(), text.to_string()));
        Ok(format!("m{}", sent.len()))
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> GatewayResult<()> {
        self.deleted
            .lock()
            .push((channel_id.to_string(), message_id.to_string()));
        Ok(())
    }

    async fn resolve_user(&self, user_id: &str) -> GatewayResult<User> {
        if self.users.contains(user_id) {
            Ok(User::new(user_id))
        } else {
            Err(GatewayError::user_not_found(user_id))
        }
    }

    async fn resolve_channel(&self, channel_id: &str) -> GatewayResult<Channel> {
        if self.channels.contains(channel_id) {
            Ok(Channel::new(channel_id))
        } else {
            Err(GatewayError::channel_not_found(channel_id))
        }
    }

    async fn open_direct_channel(&self, user_id: &str) -> GatewayResult<String> {
        if self.dm_fails {
            Err(GatewayError::NotConnected)
        } else {
            Ok(format!("dm-{user_id}"))
        }
    }

    async fn close(&self) -> GatewayResult<()> {
        *self.closed.lock() += 1;
        Ok(())
    }
}

/// Builds a context for a direct message from `author`.
pub(crate) fn direct_context(
    gateway: RecordingGateway,
    author: &str,
    content: &str,
) -> Arc<MessageContext> {
    let gateway: BoxedGateway = Arc::new(gateway);
    let event = MessageEvent::direct("m0", User::new(author), "chan", content);
    Arc::new(MessageContext::new(Arc::new(event), gateway))
}
