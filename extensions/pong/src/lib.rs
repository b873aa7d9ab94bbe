//! Example extension: answers `!ping` with `pong`.
//!
//! Load it with the descriptor `pong`, or `pong?<reply>` to change the answer:
//!
//! ```text
//! discbot -t <token> -p 'pong?Pong!'
//! ```

use std::sync::OnceLock;

use discbot_framework::prelude::*;
use tracing::debug;

/// Command word this extension answers.
pub const PING: &str = "!ping";

const DEFAULT_REPLY: &str = "pong";

/// The pong extension.
#[derive(Debug, Default)]
pub struct Pong {
    reply: OnceLock<String>,
}

impl Pong {
    fn reply(&self) -> &str {
        self.reply.get().map(String::as_str).unwrap_or(DEFAULT_REPLY)
    }
}

#[async_trait]
impl Extension for Pong {
    fn name(&self) -> &str {
        "pong"
    }

    async fn init(&self, args: &[String]) -> Result<(), BoxError> {
        if let Some(reply) = args.first().filter(|a| !a.is_empty()) {
            self.reply
                .set(reply.clone())
                .map_err(|_| "pong initialised twice")?;
        }
        debug!(reply = self.reply(), "pong ready");
        Ok(())
    }

    fn handler(&self) -> Option<BoxedHandler> {
        let reply = self.reply().to_string();
        Some(handler_fn(move |ctx| {
            let reply = reply.clone();
            async move {
                if ctx.command() == PING {
                    ctx.reply(&reply).await.map(|_| ())
                } else {
                    Ok(())
                }
            }
        }))
    }
}

declare_extension!(pub PONG_UNIT, "pong", Pong);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use discbot_core::{Channel, Dispatcher, GatewayError, GatewayResult, MessageEvent};
    use discbot_framework::{BotHost, CatalogSource, HostOptions};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Outbox(Mutex<Vec<(String, String)>>);

    #[async_trait]
    impl Gateway for Outbox {
        fn current_user_id(&self) -> &str {
            "bot"
        }

        async fn send(&self, channel_id: &str, text: &str) -> GatewayResult<String> {
            self.0.lock().push((channel_id.into(), text.into()));
            Ok("sent".into())
        }

        async fn delete_message(&self, _channel_id: &str, _message_id: &str) -> GatewayResult<()> {
            Ok(())
        }

        async fn resolve_user(&self, user_id: &str) -> GatewayResult<User> {
            Err(GatewayError::user_not_found(user_id))
        }

        async fn resolve_channel(&self, channel_id: &str) -> GatewayResult<Channel> {
            Err(GatewayError::channel_not_found(channel_id))
        }

        async fn open_direct_channel(&self, user_id: &str) -> GatewayResult<String> {
            Ok(format!("dm-{user_id}"))
        }

        async fn close(&self) -> GatewayResult<()> {
            Ok(())
        }
    }

    async fn run(descriptor: &str, messages: &[&str]) -> Vec<(String, String)> {
        let outbox = Arc::new(Outbox::default());
        let host = BotHost::new(outbox.clone(), HostOptions::default());
        let loader = host.extension_loader(Arc::new(CatalogSource));
        loader.load(descriptor).await.unwrap();

        for (i, text) in messages.iter().enumerate() {
            let event = MessageEvent::direct(i.to_string(), User::new("u"), "c", *text);
            host.dispatch(Arc::new(event)).await;
        }
        let sent = outbox.0.lock().clone();
        sent
    }

    #[tokio::test]
    async fn test_answers_ping() {
        let sent = run("pong", &["hello", "!ping", "!ping extra"]).await;
        let pong = ("c".to_string(), "pong".to_string());
        assert_eq!(sent, vec![pong.clone(), pong]);
    }

    #[tokio::test]
    async fn test_custom_reply() {
        let sent = run("./plugins/libpong.so?Pong!", &["!ping"]).await;
        assert_eq!(sent, vec![("c".to_string(), "Pong!".to_string())]);
    }
}
