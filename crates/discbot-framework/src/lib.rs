//! # discbot Framework
//!
//! The dispatch layer of the discbot host.
//!
//! This layer provides:
//! - [`HandlerChain`]: ordered, self-pruning or fire-and-forget handler dispatch
//! - [`OperatorRegistry`]: the operator set and the authorization gate
//! - [`CommandInterpreter`]: the built-in `!op`, `!deop`, `!delmsg`, `!ops` and
//!   `!quit` commands
//! - [`extension`]: the extension contract, the compiled-in catalog and the loader
//! - [`BotHost`]: the service object tying them to a gateway
//!
//! Everything here talks to the outside world only through
//! [`discbot_core::Gateway`].

pub mod chain;
pub mod command;
pub mod context;
pub mod error;
pub mod extension;
pub mod handler;
pub mod host;
pub mod operators;

#[cfg(test)]
mod test_support;

pub use chain::{DispatchMode, HandlerChain, HandlerToken};
pub use command::{BuiltinCommand, CommandInterpreter, op_reply};
pub use context::MessageContext;
pub use error::{ExtensionError, ExtensionResult};
pub use extension::{
    CatalogSource, Extension, ExtensionDescriptor, ExtensionLoader, ExtensionSource, LoadedUnit,
    MemorySource,
};
pub use handler::{BoxError, BoxedHandler, HandlerFn, IntoOutcome, MessageHandler, Retain, handler_fn};
pub use host::{BotHost, HostOptions};
pub use operators::{DENIAL_NOTICE, DenialPolicy, OpAction, OperatorRegistry};

// Used by `declare_extension!`.
#[doc(hidden)]
pub use linkme;

/// Re-exports for extension authors.
pub mod prelude {
    pub use crate::declare_extension;
    pub use crate::{
        BoxError, BoxedHandler, Extension, MessageContext, MessageHandler, Retain, handler_fn,
    };
    pub use async_trait::async_trait;
    pub use discbot_core::{Gateway, MessageEvent, User};
}
