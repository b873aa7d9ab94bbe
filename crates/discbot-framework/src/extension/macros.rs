//! Extension declaration macro.

/// Declares an extension unit and links it into [`EXTENSION_CATALOG`].
///
/// The type must implement [`Extension`] and [`Default`].
///
/// ```rust,ignore
/// use discbot_framework::prelude::*;
///
/// #[derive(Default)]
/// struct Pong;
///
/// #[async_trait]
/// impl Extension for Pong { /* ... */ }
///
/// declare_extension!(pub PONG_UNIT, "pong", Pong);
/// ```
///
/// A binary that never names anything from the extension crate may not link
/// it; referencing the (public) static keeps the entry in the catalog.
///
/// [`EXTENSION_CATALOG`]: crate::extension::EXTENSION_CATALOG
/// [`Extension`]: crate::extension::Extension
#[macro_export]
macro_rules! declare_extension {
    ($vis:vis $static_name:ident, $name:expr, $ty:ty) => {
        #[$crate::linkme::distributed_slice($crate::extension::EXTENSION_CATALOG)]
        #[linkme(crate = $crate::linkme)]
        $vis static $static_name: $crate::extension::CatalogEntry = $crate::extension::CatalogEntry {
            name: $name,
            open: |path| {
                $crate::extension::LoadedUnit::with_descriptor(
                    path,
                    $crate::extension::ExtensionDescriptor {
                        api_version: $crate::extension::EXTENSION_API_VERSION,
                        name: $name,
                        create: || {
                            ::std::sync::Arc::new(<$ty as ::std::default::Default>::default())
                                as ::std::sync::Arc<dyn $crate::extension::Extension>
                        },
                    },
                )
            },
        };
    };
}
