//! Configuration for the discbot runtime.
//!
//! Settings are layered with figment: built-in defaults, then a TOML or YAML
//! file, then `DISCBOT_*` environment variables, then the legacy
//! `DISCORDTOKEN` and `TBOPS` variables, then command-line overrides.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, LEGACY_OPERATORS_VAR, LEGACY_TOKEN_VAR, load_config};
pub use schema::{
    BotConfig, ConsoleConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    SpanEventConfig, split_operators,
};
pub use validation::validate_config;
