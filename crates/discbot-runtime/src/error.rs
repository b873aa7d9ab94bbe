//! Runtime error types.

use thiserror::Error;

use crate::config::ConfigError;
use discbot_core::GatewayError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The gateway session could not be opened.
    #[error("Gateway session failed: {0}")]
    Gateway(#[from] GatewayError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
