//! Message handler trait and closure adapters.
//!
//! A handler is an async callback run for every inbound message. Its return
//! value tells the chain whether it wants to keep running ([`Retain`]).
//!
//! ```rust,ignore
//! use discbot_framework::{Retain, handler_fn};
//!
//! // Fire-and-forget style: `()` always keeps the handler.
//! let logger = handler_fn(|ctx| async move {
//!     tracing::info!(content = %ctx.event().content, "message");
//! });
//!
//! // Self-pruning style: `false` removes the handler after this dispatch.
//! let once = handler_fn(|ctx| async move {
//!     let _ = ctx.reply("hello, once").await;
//!     false
//! });
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::MessageContext;

/// Boxed error type returned by handlers and extension hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ============================================================================
// Retain
// ============================================================================

/// Whether a handler stays registered after the current dispatch.
///
/// Only honoured in [`DispatchMode::SelfPruning`](crate::chain::DispatchMode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Retain {
    /// Keep the handler in the chain.
    #[default]
    Keep,
    /// Remove the handler once this dispatch finishes.
    Drop,
}

// ============================================================================
// IntoOutcome - convert handler return values
// ============================================================================

/// Types a handler closure may return.
pub trait IntoOutcome: Send {
    /// Converts the value into a retain verdict or an error.
    fn into_outcome(self) -> Result<Retain, BoxError>;
}

/// `()` keeps the handler.
impl IntoOutcome for () {
    fn into_outcome(self) -> Result<Retain, BoxError> {
        Ok(Retain::Keep)
    }
}

/// `true` keeps the handler, `false` drops it.
impl IntoOutcome for bool {
    fn into_outcome(self) -> Result<Retain, BoxError> {
        Ok(if self { Retain::Keep } else { Retain::Drop })
    }
}

impl IntoOutcome for Retain {
    fn into_outcome(self) -> Result<Retain, BoxError> {
        Ok(self)
    }
}

/// On `Err`, the error is reported and the handler is kept.
impl<T: IntoOutcome, E: std::fmt::Display + Send> IntoOutcome for Result<T, E> {
    fn into_outcome(self) -> Result<Retain, BoxError> {
        match self {
            Ok(t) => t.into_outcome(),
            Err(e) => Err(e.to_string().into()),
        }
    }
}

// ============================================================================
// MessageHandler Trait
// ============================================================================

/// A message processor invoked for every inbound message.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    /// Processes one message.
    async fn handle(&self, ctx: Arc<MessageContext>) -> Result<Retain, BoxError>;
}

/// A shared handler trait object.
pub type BoxedHandler = Arc<dyn MessageHandler>;

/// Wraps an async closure as a [`MessageHandler`].
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<F, Fut, R> MessageHandler for HandlerFn<F>
where
    F: Fn(Arc<MessageContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + 'static,
{
    async fn handle(&self, ctx: Arc<MessageContext>) -> Result<Retain, BoxError> {
        (self.f)(ctx).await.into_outcome()
    }
}

/// Converts an async closure into a [`BoxedHandler`].
pub fn handler_fn<F, Fut, R>(f: F) -> BoxedHandler
where
    F: Fn(Arc<MessageContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoOutcome + 'static,
{
    Arc::new(HandlerFn { f })
}
