//! The contract every extension must satisfy.

use async_trait::async_trait;

use crate::handler::{BoxError, BoxedHandler};

/// A unit of functionality loaded into the host at startup.
///
/// The loader calls [`init`](Extension::init) once with the free-form
/// arguments from the descriptor string, then registers the handler returned
/// by [`handler`](Extension::handler), if any. Extensions never see the
/// handler chain itself.
///
/// ```rust,ignore
/// #[derive(Default)]
/// struct Pong;
///
/// #[async_trait]
/// impl Extension for Pong {
///     fn name(&self) -> &str { "pong" }
///
///     async fn init(&self, _args: &[String]) -> Result<(), BoxError> { Ok(()) }
///
///     fn handler(&self) -> Option<BoxedHandler> {
///         Some(handler_fn(|ctx| async move {
///             if ctx.command() == "!ping" {
///                 let _ = ctx.reply("pong").await;
///             }
///         }))
///     }
/// }
/// ```
#[async_trait]
pub trait Extension: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Initialises the extension with the descriptor's arguments.
    async fn init(&self, args: &[String]) -> Result<(), BoxError>;

    /// The message processor to add to the handler chain.
    fn handler(&self) -> Option<BoxedHandler> {
        None
    }

    /// Teardown hook. Part of the contract, but the host has no unload path
    /// and never calls it.
    fn exit(&self) {}
}
