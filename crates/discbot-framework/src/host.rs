//! The bot host service object.
//!
//! `BotHost` owns everything one bot session needs: the gateway handle, the
//! operator registry, the handler chain, the built-in command interpreter and
//! the shutdown token. Nothing is global.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use discbot_core::{BoxedGateway, Dispatcher, MessageEvent};

use crate::chain::{DispatchMode, HandlerChain};
use crate::command::CommandInterpreter;
use crate::context::MessageContext;
use crate::extension::{ExtensionLoader, ExtensionSource};
use crate::operators::{DenialPolicy, OperatorRegistry};

/// Construction options for [`BotHost`].
#[derive(Debug, Clone, Default)]
pub struct HostOptions {
    /// Handler chain discipline.
    pub dispatch_mode: DispatchMode,
    /// What a non-operator sees when invoking a privileged command.
    pub denial_policy: DenialPolicy,
    /// Initial operator ids.
    pub operators: Vec<String>,
}

/// Routes inbound messages through the handler chain and built-in commands.
pub struct BotHost {
    gateway: BoxedGateway,
    operators: Arc<OperatorRegistry>,
    chain: Arc<HandlerChain>,
    commands: CommandInterpreter,
    shutdown: CancellationToken,
}

impl BotHost {
    /// Creates a host bound to `gateway`.
    pub fn new(gateway: BoxedGateway, options: HostOptions) -> Self {
        let operators = Arc::new(OperatorRegistry::with_operators(&options.operators));
        let chain = Arc::new(HandlerChain::new(options.dispatch_mode));
        let shutdown = CancellationToken::new();
        let commands = CommandInterpreter::new(
            Arc::clone(&operators),
            options.denial_policy,
            shutdown.clone(),
        );

        if operators.is_empty() {
            warn!("No operators configured; privileged commands are unavailable");
        }

        Self {
            gateway,
            operators,
            chain,
            commands,
            shutdown,
        }
    }

    /// The gateway handle.
    pub fn gateway(&self) -> &BoxedGateway {
        &self.gateway
    }

    /// The operator registry.
    pub fn operators(&self) -> &Arc<OperatorRegistry> {
        &self.operators
    }

    /// The handler chain.
    pub fn chain(&self) -> &Arc<HandlerChain> {
        &self.chain
    }

    /// Creates a loader that registers extension handlers on this host's chain.
    pub fn extension_loader(&self, source: Arc<dyn ExtensionSource>) -> ExtensionLoader {
        ExtensionLoader::new(source, Arc::clone(&self.chain))
    }

    /// Token cancelled when the host is asked to quit.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Returns `true` once shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

#[async_trait]
impl Dispatcher for BotHost {
    async fn dispatch(&self, event: Arc<MessageEvent>) {
        if event.author.id == self.gateway.current_user_id() {
            trace!(message_id = %event.id, "Ignoring own message");
            return;
        }

        let ctx = Arc::new(MessageContext::new(event, Arc::clone(&self.gateway)));
        let invoked = self.chain.dispatch(Arc::clone(&ctx)).await;
        trace!(message_id = %ctx.event().id, invoked, "Handler chain finished");

        self.commands.execute(&ctx).await;
    }
}

impl std::fmt::Debug for BotHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotHost")
            .field("chain", &self.chain)
            .field("operators", &self.operators)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use crate::test_support::{BOT_ID, RecordingGateway};
    use discbot_core::User;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn host(gateway: Arc<RecordingGateway>) -> BotHost {
        BotHost::new(
            gateway,
            HostOptions {
                operators: vec!["op".into()],
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_own_messages_are_ignored() {
        let gw = Arc::new(RecordingGateway::new());
        let host = host(Arc::clone(&gw));
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        host.chain().register(handler_fn(move |_ctx| {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        }));

        let own = MessageEvent::direct("m1", User::new(BOT_ID), "chan", "!ops");
        host.dispatch(Arc::new(own)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let other = MessageEvent::direct("m2", User::new("someone"), "chan", "hi");
        host.dispatch(Arc::new(other)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_quit_cancels_shutdown_token() {
        let gw = Arc::new(RecordingGateway::new());
        let host = host(Arc::clone(&gw));
        let token = host.shutdown_token();

        let quit = MessageEvent::direct("m1", User::new("op"), "chan", "!quit");
        host.dispatch(Arc::new(quit)).await;
        assert!(token.is_cancelled());
        assert!(host.is_shutting_down());
        assert_eq!(gw.close_count(), 1);
    }
}
