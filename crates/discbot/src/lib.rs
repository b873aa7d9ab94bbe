//! # discbot
//!
//! A chat-bot host. It keeps a session open to a messaging gateway, runs
//! every inbound message through an ordered chain of pluggable handlers and
//! answers a small set of built-in operator commands.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐  events  ┌─────────┐     ┌───────────────┐     ┌──────────────────┐
//! │  Gateway  │─────────▶│ BotHost │────▶│ HandlerChain  │────▶│ CommandInterpreter│
//! │ (session) │◀─────────│         │     │ (extensions)  │     │ !op !deop !ops … │
//! └───────────┘  send    └─────────┘     └───────────────┘     └──────────────────┘
//! ```
//!
//! - **Gateway**: the outbound capability set (`send`, `delete_message`, lookups)
//! - **BotHost**: owns the operators, the chain and the shutdown token
//! - **Extensions**: loaded at startup; their handlers are registered by the host
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use discbot::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = BotRuntime::builder().build()?;
//!     let connector = ConsoleConnector::stdio(runtime.config().console.clone());
//!     runtime.run(&connector).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use discbot_core as core;
pub use discbot_framework as framework;
pub use discbot_runtime as runtime;

/// Prelude module for convenient imports.
pub mod prelude {
    // Runtime - main entry point
    pub use discbot_runtime::{BotRuntime, ConsoleConnector, StopReason};

    // Host and dispatch
    pub use discbot_framework::{
        BotHost, DenialPolicy, DispatchMode, HandlerChain, HandlerToken, HostOptions,
        OperatorRegistry,
    };

    // Writing handlers and extensions
    pub use discbot_framework::prelude::*;

    // Gateway capability
    pub use discbot_core::{BoxedGateway, Connector, GatewayError, GatewayResult};
}
