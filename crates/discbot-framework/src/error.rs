//! Error types for the discbot framework.

use thiserror::Error;

/// Reasons an extension failed to load.
///
/// A failed load never touches the handler chain and never stops the host.
#[derive(Debug, Error)]
pub enum ExtensionError {
    /// The descriptor string has no load path.
    #[error("invalid extension descriptor '{0}'")]
    InvalidDescriptor(String),

    /// The code unit at `path` could not be opened.
    #[error("failed to open extension '{path}': {reason}")]
    Open {
        /// Load path from the descriptor.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// The unit does not export the well-known symbol.
    #[error("extension '{path}' does not export symbol '{symbol}'")]
    SymbolMissing {
        /// Load path from the descriptor.
        path: String,
        /// The symbol that was looked up.
        symbol: &'static str,
    },

    /// The exported symbol does not satisfy the extension contract.
    #[error("unexpected type from symbol '{symbol}' in extension '{path}'")]
    ContractMismatch {
        /// Load path from the descriptor.
        path: String,
        /// The symbol that was looked up.
        symbol: &'static str,
    },

    /// The extension was built against an incompatible API version.
    #[error("extension '{name}' targets API {found}, host provides {expected}")]
    IncompatibleVersion {
        /// Extension name.
        name: String,
        /// Version the extension was built against (`major.minor`).
        found: String,
        /// Host version (`major.minor`).
        expected: String,
    },

    /// The extension's `init` returned an error.
    #[error("extension '{name}' failed to initialize: {reason}")]
    Init {
        /// Extension name.
        name: String,
        /// Error reported by the extension.
        reason: String,
    },
}

/// Result type for extension loading.
pub type ExtensionResult<T> = Result<T, ExtensionError>;
