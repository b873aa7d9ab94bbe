//! The ordered handler chain.
//!
//! Handlers are stored in an index-stable arena: removing a handler leaves a
//! tombstone in its slot, so registration order is always invocation order and
//! a [`HandlerToken`] keeps pointing at the same slot until [`HandlerChain::compact`]
//! reclaims the tombstones.
//!
//! # Dispatch disciplines
//!
//! | Mode | Verdict |
//! |---|---|
//! | [`DispatchMode::FireAndForget`] | ignored, every handler runs on every message |
//! | [`DispatchMode::SelfPruning`] | [`Retain::Drop`] tombstones the handler as soon as it returns |
//!
//! In both modes a handler that errors or panics is logged and kept, and the
//! remaining handlers still run.

use std::any::Any;
use std::borrow::Cow;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::context::MessageContext;
use crate::handler::{BoxedHandler, Retain};

/// How the chain treats handler verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Every handler is called on every message; verdicts are ignored.
    FireAndForget,
    /// A [`Retain::Drop`] verdict removes the handler permanently.
    #[default]
    SelfPruning,
}

/// Opaque registration token. Never reused within one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerToken(u64);

impl std::fmt::Display for HandlerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Slot {
    token: HandlerToken,
    name: Cow<'static, str>,
    /// `None` once the handler has been removed.
    handler: Option<BoxedHandler>,
}

/// Ordered, mutable collection of message handlers.
///
/// `HandlerChain` is `Send + Sync`; registration takes a short write lock and
/// dispatch only holds a read lock while snapshotting the live handlers.
pub struct HandlerChain {
    mode: DispatchMode,
    /// Slots in registration order; tokens are strictly increasing.
    slots: RwLock<Vec<Slot>>,
    next_token: AtomicU64,
}

impl HandlerChain {
    /// Creates an empty chain.
    pub fn new(mode: DispatchMode) -> Self {
        Self {
            mode,
            slots: RwLock::new(Vec::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// The dispatch discipline of this chain.
    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Appends an anonymous handler.
    pub fn register(&self, handler: BoxedHandler) -> HandlerToken {
        self.register_named("anonymous", handler)
    }

    /// Appends a handler with a name used in logs.
    pub fn register_named(
        &self,
        name: impl Into<Cow<'static, str>>,
        handler: BoxedHandler,
    ) -> HandlerToken {
        let token = HandlerToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let name = name.into();
        debug!(handler = %name, token = %token, "Handler registered");
        self.slots.write().push(Slot {
            token,
            name,
            handler: Some(handler),
        });
        token
    }

    /// Removes a handler. Returns `false` if the token was unknown or already removed.
    pub fn remove(&self, token: HandlerToken) -> bool {
        let mut slots = self.slots.write();
        let Ok(pos) = slots.binary_search_by_key(&token, |s| s.token) else {
            return false;
        };
        let slot = &mut slots[pos];
        if slot.handler.take().is_some() {
            debug!(handler = %slot.name, token = %token, "Handler removed");
            true
        } else {
            false
        }
    }

    /// Returns `true` if the token refers to a live handler.
    pub fn contains(&self, token: HandlerToken) -> bool {
        let slots = self.slots.read();
        slots
            .binary_search_by_key(&token, |s| s.token)
            .is_ok_and(|pos| slots[pos].handler.is_some())
    }

    /// Number of live handlers.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .iter()
            .filter(|s| s.handler.is_some())
            .count()
    }

    /// Returns `true` when no live handlers remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops tombstoned slots. Order and live tokens are unaffected.
    pub fn compact(&self) -> usize {
        let mut slots = self.slots.write();
        let before = slots.len();
        slots.retain(|s| s.handler.is_some());
        before - slots.len()
    }

    /// Runs every live handler, in registration order, on `ctx`.
    ///
    /// Returns the number of handlers invoked.
    pub async fn dispatch(&self, ctx: Arc<MessageContext>) -> usize {
        let snapshot: Vec<(HandlerToken, Cow<'static, str>, BoxedHandler)> = self
            .slots
            .read()
            .iter()
            .filter_map(|s| {
                s.handler
                    .as_ref()
                    .map(|h| (s.token, s.name.clone(), Arc::clone(h)))
            })
            .collect();

        let mut invoked = 0;

        for (token, name, handler) in snapshot {
            // A handler removed by an earlier one in this same dispatch is skipped.
            if !self.contains(token) {
                continue;
            }
            invoked += 1;

            let outcome = AssertUnwindSafe(handler.handle(Arc::clone(&ctx)))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(Retain::Keep)) => {}
                Ok(Ok(Retain::Drop)) => {
                    if self.mode == DispatchMode::SelfPruning {
                        // Tombstoned at once so concurrent dispatches skip it.
                        if self.remove(token) {
                            debug!(token = %token, "Handler pruned itself from the chain");
                        }
                    } else {
                        trace!(handler = %name, "Drop verdict ignored in fire-and-forget mode");
                    }
                }
                Ok(Err(e)) => {
                    error!(handler = %name, token = %token, error = %e, "Handler returned an error");
                }
                Err(panic) => {
                    error!(
                        handler = %name,
                        token = %token,
                        panic = %panic_message(panic.as_ref()),
                        "Handler panicked"
                    );
                }
            }
        }

        invoked
    }
}

impl Default for HandlerChain {
    fn default() -> Self {
        Self::new(DispatchMode::default())
    }
}

impl std::fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerChain")
            .field("mode", &self.mode)
            .field("live", &self.len())
            .finish()
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
