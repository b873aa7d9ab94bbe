//! discbot Runtime - orchestration layer for the discbot host.
//!
//! This crate provides:
//! - Configuration loading and validation (`config`)
//! - Logging setup (`logging`)
//! - A console gateway speaking JSON lines (`ConsoleConnector`)
//! - Session orchestration and shutdown handling (`BotRuntime`)
//!
//! ```ignore
//! use discbot_runtime::{BotRuntime, ConsoleConnector};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = BotRuntime::builder().build()?;
//!     let connector = ConsoleConnector::stdio(runtime.config().console.clone());
//!     runtime.run(&connector).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{BotConfig, ConfigError, ConfigLoader, ConfigResult};
pub use console::{CONSOLE_CHANNEL, CONSOLE_USER, ConsoleConnector, ConsoleGateway};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{BotRuntime, RuntimeBuilder, StopReason, wait_for_signal};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
