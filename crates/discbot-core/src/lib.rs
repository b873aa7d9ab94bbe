//! # discbot core
//!
//! Fundamental types for the discbot host:
//!
//! - **Gateway**: the narrow outbound capability set of a chat session
//!   ([`Gateway`], [`Connector`], [`GatewaySession`])
//! - **Messages**: the inbound event model and its naive tokenizer
//!   ([`MessageEvent`], [`User`], [`Channel`], [`tokenize`])
//! - **Dispatch**: the seam between the event stream and the host ([`Dispatcher`])
//! - **Mentions**: id/mention conversion helpers
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌───────────────┐
//! │   Gateway   │────▶│ Dispatcher │────▶│ Handler chain │
//! │  (session)  │◀────│  (host)    │────▶│ Commands      │
//! └─────────────┘     └────────────┘     └───────────────┘
//! ```

pub mod dispatcher;
pub mod error;
pub mod gateway;
pub mod mention;
pub mod message;

pub use dispatcher::Dispatcher;
pub use error::{GatewayError, GatewayResult};
pub use gateway::{BoxedGateway, Connector, Gateway, GatewaySession};
pub use mention::{chan_id_to_mention, chan_mention_to_id, parse_user_mention, user_id_to_mention};
pub use message::{Channel, MessageEvent, User, tokenize};
