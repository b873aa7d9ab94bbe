//! Extension descriptor: the static, `Copy` handle exported by a unit.

use std::sync::Arc;

use super::Extension;

/// Current extension API version (1.0).
pub const EXTENSION_API_VERSION: u32 = 0x0001_0000;

/// Name of the symbol a unit must export.
pub const EXTENSION_SYMBOL: &str = "Bot";

/// Identifies and instantiates an extension.
///
/// Units export one of these under [`EXTENSION_SYMBOL`]; use
/// [`declare_extension!`](crate::declare_extension) to build one.
#[derive(Debug, Clone, Copy)]
pub struct ExtensionDescriptor {
    /// API version this descriptor was compiled against.
    pub api_version: u32,

    /// Extension name.
    pub name: &'static str,

    /// Factory for the live extension.
    pub create: fn() -> Arc<dyn Extension>,
}

impl ExtensionDescriptor {
    /// Returns `true` if the descriptor is compatible with the running host.
    ///
    /// The major part must match exactly; the descriptor's minor part must be
    /// ≤ the host's minor part.
    pub fn is_compatible(&self) -> bool {
        let host_major = EXTENSION_API_VERSION >> 16;
        let desc_major = self.api_version >> 16;
        let desc_minor = self.api_version & 0xFFFF;
        let host_minor = EXTENSION_API_VERSION & 0xFFFF;
        desc_major == host_major && desc_minor <= host_minor
    }

    /// Creates the live extension.
    #[inline]
    pub fn instantiate(&self) -> Arc<dyn Extension> {
        (self.create)()
    }
}

/// Formats a packed version as `major.minor`.
pub fn version_string(version: u32) -> String {
    format!("{}.{}", version >> 16, version & 0xFFFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::BoxError;
    use async_trait::async_trait;

    struct Nop;

    #[async_trait]
    impl Extension for Nop {
        fn name(&self) -> &str {
            "nop"
        }

        async fn init(&self, _args: &[String]) -> Result<(), BoxError> {
            Ok(())
        }
    }

    fn desc(api_version: u32) -> ExtensionDescriptor {
        ExtensionDescriptor {
            api_version,
            name: "nop",
            create: || Arc::new(Nop),
        }
    }

    #[test]
    fn test_compatibility() {
        assert!(desc(EXTENSION_API_VERSION).is_compatible());
        assert!(desc(0x0001_0000).is_compatible());
        assert!(!desc(0x0001_0001).is_compatible());
        assert!(!desc(0x0002_0000).is_compatible());
        assert_eq!(version_string(0x0002_0003), "2.3");
    }
}
