//! Integration test common infrastructure.
//!
//! Provides a recording gateway and helpers for driving a `BotHost` with
//! synthetic message events.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use discbot_core::{
    Channel, Dispatcher, Gateway, GatewayError, GatewayResult, MessageEvent, User,
};
use discbot_framework::{BotHost, DenialPolicy, DispatchMode, HostOptions};

pub const BOT_ID: &str = "bot";

/// Gateway that records every outbound call.
#[derive(Default)]
pub struct MockGateway {
    users: HashSet<String>,
    channels: HashSet<String>,
    pub sent: Mutex<Vec<(String, String)>>,
    pub deleted: Mutex<Vec<(String, String)>>,
    pub closes: Mutex<usize>,
}

#[allow(dead_code)]
impl MockGateway {
    pub fn new(users: &[&str], channels: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            users: users.iter().map(|s| s.to_string()).collect(),
            channels: channels.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        })
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }

    /// Messages sent to a private channel with `user_id`.
    pub fn sent_to_dm(&self, user_id: &str) -> Vec<String> {
        let dm = format!("dm-{user_id}");
        self.sent
            .lock()
            .iter()
            .filter(|(c, _)| *c == dm)
            .map(|(_, t)| t.clone())
            .collect()
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().clone()
    }

    pub fn closes(&self) -> usize {
        *self.closes.lock()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    fn current_user_id(&self) -> &str {
        BOT_ID
    }

    async fn send(&self, channel_id: &str, text: &str) -> GatewayResult<String> {
        let mut sent = self.sent.lock();
        sent.push((channel_id.to_string(), text.to_string()));
        Ok(format!("out{}", sent.len()))
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> GatewayResult<()> {
        if !self.channels.contains(channel_id) {
            return Err(GatewayError::channel_not_found(channel_id));
        }
        self.deleted
            .lock()
            .push((channel_id.to_string(), message_id.to_string()));
        Ok(())
    }

    async fn resolve_user(&self, user_id: &str) -> GatewayResult<User> {
        self.users
            .contains(user_id)
            .then(|| User::new(user_id))
            .ok_or_else(|| GatewayError::user_not_found(user_id))
    }

    async fn resolve_channel(&self, channel_id: &str) -> GatewayResult<Channel> {
        self.channels
            .contains(channel_id)
            .then(|| Channel::new(channel_id))
            .ok_or_else(|| GatewayError::channel_not_found(channel_id))
    }

    async fn open_direct_channel(&self, user_id: &str) -> GatewayResult<String> {
        Ok(format!("dm-{user_id}"))
    }

    async fn close(&self) -> GatewayResult<()> {
        *self.closes.lock() += 1;
        Ok(())
    }
}

/// Builds a host over `gateway` with the given initial operators.
#[allow(dead_code)]
pub fn host(gateway: &Arc<MockGateway>, operators: &[&str], mode: DispatchMode) -> BotHost {
    BotHost::new(
        gateway.clone(),
        HostOptions {
            dispatch_mode: mode,
            denial_policy: DenialPolicy::Notify,
            operators: operators.iter().map(|s| s.to_string()).collect(),
        },
    )
}

static NEXT_ID: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);

/// Sends a direct message from `author` through the host.
#[allow(dead_code)]
pub async fn dm(host: &BotHost, author: &str, content: &str) {
    let id = NEXT_ID.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let event = MessageEvent::direct(format!("in{id}"), User::new(author), "chan", content);
    host.dispatch(Arc::new(event)).await;
}

/// Dispatches a prepared event.
#[allow(dead_code)]
pub async fn send_event(host: &BotHost, event: MessageEvent) {
    host.dispatch(Arc::new(event)).await;
}
