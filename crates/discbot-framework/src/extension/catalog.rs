//! Loadable code units and the sources that open them.
//!
//! A [`LoadedUnit`] is a table of named, type-erased symbols. The loader only
//! ever looks up [`EXTENSION_SYMBOL`](super::EXTENSION_SYMBOL) and downcasts it
//! to an [`ExtensionDescriptor`]; anything else exported under that name is a
//! contract mismatch.
//!
//! Units linked into the binary register themselves in [`EXTENSION_CATALOG`]
//! through [`declare_extension!`](crate::declare_extension), and
//! [`CatalogSource`] opens them by path.

use std::any::Any;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use linkme::distributed_slice;
use tracing::trace;

use super::{EXTENSION_SYMBOL, ExtensionDescriptor};
use crate::error::{ExtensionError, ExtensionResult};

/// A type-erased exported symbol.
pub type Symbol = Arc<dyn Any + Send + Sync>;

/// An opened code unit.
#[derive(Clone)]
pub struct LoadedUnit {
    path: String,
    symbols: HashMap<String, Symbol>,
}

impl LoadedUnit {
    /// Creates an empty unit for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            symbols: HashMap::new(),
        }
    }

    /// Creates a unit exporting `descriptor` under the well-known symbol.
    pub fn with_descriptor(path: impl Into<String>, descriptor: ExtensionDescriptor) -> Self {
        Self::new(path).export(EXTENSION_SYMBOL, descriptor)
    }

    /// Adds an exported symbol.
    pub fn export<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.symbols.insert(name.into(), Arc::new(value));
        self
    }

    /// Looks up an exported symbol.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Path the unit was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for LoadedUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.symbols.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("LoadedUnit")
            .field("path", &self.path)
            .field("symbols", &names)
            .finish()
    }
}

// =============================================================================
// Catalog (linkme distributed slice)
// =============================================================================

/// One statically linked extension unit.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    /// Unit name, matched against the file stem of a load path.
    pub name: &'static str,
    /// Opens the unit.
    pub open: fn(&str) -> LoadedUnit,
}

/// Registry of statically linked extension units.
/// Each crate built with `declare_extension!` contributes one entry.
#[distributed_slice]
pub static EXTENSION_CATALOG: [CatalogEntry];

// =============================================================================
// Sources
// =============================================================================

/// Opens code units by load path.
pub trait ExtensionSource: Send + Sync {
    /// Opens the unit at `path`.
    fn open(&self, path: &str) -> ExtensionResult<LoadedUnit>;
}

/// Opens units from [`EXTENSION_CATALOG`].
///
/// A path matches an entry when its file stem, with any `lib` prefix removed,
/// equals the entry name: `./plugins/libpong.so`, `pong.dll` and `pong` all
/// open the `pong` unit.
#[derive(Debug, Default, Clone, Copy)]
pub struct CatalogSource;

impl CatalogSource {
    /// Names of every linked unit.
    pub fn available(&self) -> Vec<&'static str> {
        EXTENSION_CATALOG.iter().map(|e| e.name).collect()
    }
}

impl ExtensionSource for CatalogSource {
    fn open(&self, path: &str) -> ExtensionResult<LoadedUnit> {
        let stem = unit_stem(path);
        trace!(path = %path, stem = %stem, "Looking up extension in catalog");
        EXTENSION_CATALOG
            .iter()
            .find(|e| e.name == stem)
            .map(|e| (e.open)(path))
            .ok_or_else(|| ExtensionError::Open {
                path: path.to_string(),
                reason: "no such extension unit".to_string(),
            })
    }
}

fn unit_stem(path: &str) -> &str {
    let stem = Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(path);
    stem.strip_prefix("lib").unwrap_or(stem)
}

/// Opens units from an in-memory table.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    units: HashMap<String, LoadedUnit>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit under its own path.
    pub fn with_unit(mut self, unit: LoadedUnit) -> Self {
        self.units.insert(unit.path.clone(), unit);
        self
    }
}

impl ExtensionSource for MemorySource {
    fn open(&self, path: &str) -> ExtensionResult<LoadedUnit> {
        self.units
            .get(path)
            .cloned()
            .ok_or_else(|| ExtensionError::Open {
                path: path.to_string(),
                reason: "not found".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_stem() {
        assert_eq!(unit_stem("./plugins/libpong.so"), "pong");
        assert_eq!(unit_stem("pong.dll"), "pong");
        assert_eq!(unit_stem("pong"), "pong");
    }

    #[test]
    fn test_catalog_rejects_unknown_unit() {
        let err = CatalogSource.open("./definitely-missing.so").unwrap_err();
        assert!(matches!(err, ExtensionError::Open { .. }));
    }

    #[test]
    fn test_memory_source_lookup() {
        let src = MemorySource::new().with_unit(LoadedUnit::new("a.so").export("x", 1u8));
        let unit = src.open("a.so").unwrap();
        assert_eq!(unit.path(), "a.so");
        assert!(unit.lookup("x").is_some());
        assert!(unit.lookup(EXTENSION_SYMBOL).is_none());
        assert!(src.open("b.so").is_err());
    }
}
