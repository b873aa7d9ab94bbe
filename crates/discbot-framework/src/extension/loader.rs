//! Extension loading.
//!
//! A descriptor string names one unit and the arguments for its `init`:
//!
//! ```text
//! ./plugins/pong.so?verbose?#general
//! └──── path ─────┘ └─── args ────┘
//! ```
//!
//! Loading never hands the chain to the extension. The loader asks for a
//! handler and registers it itself.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, error, info};

use super::{
    EXTENSION_API_VERSION, EXTENSION_SYMBOL, Extension, ExtensionDescriptor, ExtensionSource,
    version_string,
};
use crate::chain::{HandlerChain, HandlerToken, panic_message};
use crate::error::{ExtensionError, ExtensionResult};

/// Separator between the load path and the init arguments.
pub const DESCRIPTOR_SEPARATOR: char = '?';

/// Splits a descriptor into its load path and init arguments.
///
/// Arguments are passed on verbatim, empty segments included.
pub fn parse_descriptor(descriptor: &str) -> ExtensionResult<(&str, Vec<String>)> {
    let mut parts = descriptor.split(DESCRIPTOR_SEPARATOR);
    let path = parts.next().unwrap_or_default().trim();
    if path.is_empty() {
        return Err(ExtensionError::InvalidDescriptor(descriptor.to_string()));
    }
    Ok((path, parts.map(str::to_string).collect()))
}

/// A successfully loaded extension.
pub struct LoadedExtension {
    /// Extension name from the descriptor.
    pub name: &'static str,
    /// Load path.
    pub path: String,
    /// Token of the auto-registered handler, if the extension provided one.
    pub token: Option<HandlerToken>,
    /// The live extension. Kept alive for the lifetime of the host.
    pub extension: Arc<dyn Extension>,
}

impl std::fmt::Debug for LoadedExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedExtension")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Loads extensions from a source and wires their handlers into a chain.
pub struct ExtensionLoader {
    source: Arc<dyn ExtensionSource>,
    chain: Arc<HandlerChain>,
    loaded: Mutex<Vec<LoadedExtension>>,
}

impl ExtensionLoader {
    /// Creates a loader registering into `chain`.
    pub fn new(source: Arc<dyn ExtensionSource>, chain: Arc<HandlerChain>) -> Self {
        Self {
            source,
            chain,
            loaded: Mutex::new(Vec::new()),
        }
    }

    /// Loads one extension.
    ///
    /// Returns the token of the registered handler, or `None` if the extension
    /// has no handler. On error the chain is unchanged.
    pub async fn load(&self, descriptor: &str) -> ExtensionResult<Option<HandlerToken>> {
        let (path, args) = parse_descriptor(descriptor)?;
        debug!(path = %path, ?args, "Loading extension");

        let unit = self.source.open(path)?;
        let symbol = unit
            .lookup(EXTENSION_SYMBOL)
            .ok_or_else(|| ExtensionError::SymbolMissing {
                path: path.to_string(),
                symbol: EXTENSION_SYMBOL,
            })?;
        let descriptor = *symbol
            .downcast_ref::<ExtensionDescriptor>()
            .ok_or_else(|| ExtensionError::ContractMismatch {
                path: path.to_string(),
                symbol: EXTENSION_SYMBOL,
            })?;

        if !descriptor.is_compatible() {
            return Err(ExtensionError::IncompatibleVersion {
                name: descriptor.name.to_string(),
                found: version_string(descriptor.api_version),
                expected: version_string(EXTENSION_API_VERSION),
            });
        }

        let extension = descriptor.instantiate();
        let init_failed = |reason: String| ExtensionError::Init {
            name: descriptor.name.to_string(),
            reason,
        };
        match AssertUnwindSafe(extension.init(&args)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(init_failed(e.to_string())),
            Err(panic) => {
                return Err(init_failed(format!(
                    "panicked: {}",
                    panic_message(panic.as_ref())
                )));
            }
        }

        let token = extension
            .handler()
            .map(|handler| self.chain.register_named(descriptor.name, handler));

        info!(
            extension = %descriptor.name,
            path = %path,
            handler = token.is_some(),
            "Extension loaded"
        );

        self.loaded.lock().push(LoadedExtension {
            name: descriptor.name,
            path: path.to_string(),
            token,
            extension,
        });
        Ok(token)
    }

    /// Loads every descriptor in order. Failures are logged and skipped.
    ///
    /// Returns the number of extensions loaded.
    pub async fn load_all<I, S>(&self, descriptors: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut count = 0;
        for descriptor in descriptors {
            let descriptor = descriptor.as_ref();
            match self.load(descriptor).await {
                Ok(_) => count += 1,
                Err(e) => error!(descriptor = %descriptor, error = %e, "Failed to load extension"),
            }
        }
        count
    }

    /// Names of the loaded extensions, in load order.
    pub fn loaded_names(&self) -> Vec<&'static str> {
        self.loaded.lock().iter().map(|l| l.name).collect()
    }

    /// Number of loaded extensions.
    pub fn loaded_count(&self) -> usize {
        self.loaded.lock().len()
    }
}

impl std::fmt::Debug for ExtensionLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionLoader")
            .field("loaded", &self.loaded_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::DispatchMode;
    use crate::extension::{LoadedUnit, MemorySource};
    use crate::handler::{BoxError, BoxedHandler, handler_fn};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static INIT_CALLS: AtomicUsize = AtomicUsize::new(0);

    struct Echo;

    #[async_trait]
    impl Extension for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        async fn init(&self, args: &[String]) -> Result<(), BoxError> {
            INIT_CALLS.fetch_add(1, Ordering::SeqCst);
            if args.first().map(String::as_str) == Some("fail") {
                return Err("refused".into());
            }
            Ok(())
        }

        fn handler(&self) -> Option<BoxedHandler> {
            Some(handler_fn(|_ctx| async {}))
        }
    }

    struct Faulty;

    #[async_trait]
    impl Extension for Faulty {
        fn name(&self) -> &str {
            "faulty"
        }

        async fn init(&self, _args: &[String]) -> Result<(), BoxError> {
            panic!("bad init");
        }

        fn handler(&self) -> Option<BoxedHandler> {
            Some(handler_fn(|_ctx| async {}))
        }
    }

    fn faulty() -> Arc<dyn Extension> {
        Arc::new(Faulty)
    }

    struct Quiet;

    #[async_trait]
    impl Extension for Quiet {
        fn name(&self) -> &str {
            "quiet"
        }

        async fn init(&self, _args: &[String]) -> Result<(), BoxError> {
            Ok(())
        }
    }

    fn echo() -> Arc<dyn Extension> {
        Arc::new(Echo)
    }

    fn quiet() -> Arc<dyn Extension> {
        Arc::new(Quiet)
    }

    fn descriptor(
        name: &'static str,
        api_version: u32,
        create: fn() -> Arc<dyn Extension>,
    ) -> ExtensionDescriptor {
        ExtensionDescriptor {
            api_version,
            name,
            create,
        }
    }

    fn loader() -> (ExtensionLoader, Arc<HandlerChain>) {
        let source = MemorySource::new()
            .with_unit(LoadedUnit::with_descriptor(
                "echo.so",
                descriptor("echo", EXTENSION_API_VERSION, echo),
            ))
            .with_unit(LoadedUnit::with_descriptor(
                "quiet.so",
                descriptor("quiet", EXTENSION_API_VERSION, quiet),
            ))
            .with_unit(LoadedUnit::with_descriptor(
                "future.so",
                descriptor("echo", 0x0002_0000, echo),
            ))
            .with_unit(LoadedUnit::with_descriptor(
                "faulty.so",
                descriptor("faulty", EXTENSION_API_VERSION, faulty),
            ))
            .with_unit(LoadedUnit::new("wrong.so").export(EXTENSION_SYMBOL, "not a descriptor"))
            .with_unit(LoadedUnit::new("empty.so"));
        let chain = Arc::new(HandlerChain::new(DispatchMode::SelfPruning));
        (
            ExtensionLoader::new(Arc::new(source), Arc::clone(&chain)),
            chain,
        )
    }

    #[test]
    fn test_parse_descriptor() {
        let (path, args) = parse_descriptor("p.so?a??b").unwrap();
        assert_eq!(path, "p.so");
        assert_eq!(args, vec!["a", "", "b"]);

        let (path, args) = parse_descriptor("p.so").unwrap();
        assert_eq!(path, "p.so");
        assert!(args.is_empty());

        assert!(matches!(
            parse_descriptor("?a"),
            Err(ExtensionError::InvalidDescriptor(_))
        ));
    }

    #[tokio::test]
    async fn test_load_registers_handler() {
        let (loader, chain) = loader();
        let token = loader.load("echo.so?x").await.unwrap();
        assert!(token.is_some_and(|t| chain.contains(t)));
        assert_eq!(chain.len(), 1);
        assert_eq!(loader.loaded_names(), vec!["echo"]);
    }

    #[tokio::test]
    async fn test_load_without_handler() {
        let (loader, chain) = loader();
        assert_eq!(loader.load("quiet.so").await.unwrap(), None);
        assert!(chain.is_empty());
        assert_eq!(loader.loaded_count(), 1);
    }

    #[tokio::test]
    async fn test_contract_mismatch_leaves_chain_unchanged() {
        let (loader, chain) = loader();
        let err = loader.load("wrong.so").await.unwrap_err();
        assert!(matches!(err, ExtensionError::ContractMismatch { .. }));
        assert!(chain.is_empty());
        assert_eq!(loader.loaded_count(), 0);
    }

    #[tokio::test]
    async fn test_load_failures() {
        let (loader, chain) = loader();
        assert!(matches!(
            loader.load("empty.so").await,
            Err(ExtensionError::SymbolMissing { .. })
        ));
        assert!(matches!(
            loader.load("missing.so").await,
            Err(ExtensionError::Open { .. })
        ));
        assert!(matches!(
            loader.load("future.so").await,
            Err(ExtensionError::IncompatibleVersion { .. })
        ));

        let before = INIT_CALLS.load(Ordering::SeqCst);
        assert!(matches!(
            loader.load("echo.so?fail").await,
            Err(ExtensionError::Init { .. })
        ));
        assert!(INIT_CALLS.load(Ordering::SeqCst) > before);
        assert!(chain.is_empty());
    }

    #[tokio::test]
    async fn test_load_all_skips_failures() {
        let (loader, chain) = loader();
        let n = loader
            .load_all(["echo.so", "wrong.so", "quiet.so", "echo.so?fail"])
            .await;
        assert_eq!(n, 2);
        assert_eq!(chain.len(), 1);
        assert_eq!(loader.loaded_names(), vec!["echo", "quiet"]);
    }

    #[tokio::test]
    async fn test_panicking_init_is_contained() {
        let (loader, chain) = loader();
        let err = loader.load("faulty.so").await.unwrap_err();
        match err {
            ExtensionError::Init { name, reason } => {
                assert_eq!(name, "faulty");
                assert!(reason.contains("bad init"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(chain.is_empty());

        assert_eq!(loader.load_all(["faulty.so", "quiet.so"]).await, 1);
        assert_eq!(loader.loaded_names(), vec!["quiet"]);
    }
}
