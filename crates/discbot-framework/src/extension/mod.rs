//! Extension contract, catalog and loader.
//!
//! # Lifecycle
//!
//! 1. The loader opens a unit through an [`ExtensionSource`].
//! 2. It looks up the [`EXTENSION_SYMBOL`] export and downcasts it to an
//!    [`ExtensionDescriptor`].
//! 3. The descriptor's API version is checked against the host's.
//! 4. The extension is instantiated and [`Extension::init`] runs with the
//!    descriptor arguments.
//! 5. If the extension provides a handler, the loader registers it on the
//!    chain.
//!
//! Extensions are never unloaded.

mod catalog;
mod contract;
mod descriptor;
mod loader;
mod macros;

pub use catalog::{
    CatalogEntry, CatalogSource, EXTENSION_CATALOG, ExtensionSource, LoadedUnit, MemorySource,
    Symbol,
};
pub use contract::Extension;
pub use descriptor::{
    EXTENSION_API_VERSION, EXTENSION_SYMBOL, ExtensionDescriptor, version_string,
};
pub use loader::{DESCRIPTOR_SEPARATOR, ExtensionLoader, LoadedExtension, parse_descriptor};
