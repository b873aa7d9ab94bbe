//! Main runtime orchestration.
//!
//! ```rust,ignore
//! use discbot_runtime::{BotRuntime, ConsoleConnector};
//!
//! let runtime = BotRuntime::builder()
//!     .config_file("discbot.toml")
//!     .token(cli.token)
//!     .build()?;
//!
//! let connector = ConsoleConnector::stdio(runtime.config().console.clone());
//! runtime.run(&connector).await?;
//! ```
//!
//! A run connects the gateway, builds the [`BotHost`], loads the configured
//! extensions and then dispatches inbound messages until Ctrl-C, SIGTERM,
//! `!quit` or the end of the event stream.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use tokio::signal;
use tracing::{Instrument, debug, debug_span, info, warn};

use discbot_core::{Connector, Dispatcher, MessageEvent};
use discbot_framework::{BotHost, CatalogSource, ExtensionSource, HostOptions};

use crate::config::{BotConfig, ConfigLoader, ConfigResult, validate_config};
use crate::error::RuntimeResult;
use crate::logging;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Ctrl-C, SIGTERM or a caller-provided shutdown future.
    Signal,
    /// An operator issued `!quit`.
    Quit,
    /// The gateway stopped delivering events.
    SessionEnded,
}

/// Orchestrates one bot session.
pub struct BotRuntime {
    config: BotConfig,
    source: Arc<dyn ExtensionSource>,
}

impl BotRuntime {
    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration and initializes logging.
    ///
    /// Extensions are opened from the compiled-in catalog.
    pub fn from_config(config: BotConfig) -> Self {
        logging::init_from_config(&config.logging);
        debug!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            "Runtime initialized from configuration"
        );
        Self {
            config,
            source: Arc::new(CatalogSource),
        }
    }

    /// Replaces the source extensions are opened from.
    pub fn with_extension_source(mut self, source: Arc<dyn ExtensionSource>) -> Self {
        self.source = source;
        self
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Runs until Ctrl-C, SIGTERM, `!quit` or the end of the session.
    pub async fn run<C: Connector>(&self, connector: &C) -> RuntimeResult<StopReason> {
        self.run_until(connector, wait_for_signal()).await
    }

    /// Runs with a custom shutdown future in place of process signals.
    pub async fn run_until<C, F>(&self, connector: &C, shutdown: F) -> RuntimeResult<StopReason>
    where
        C: Connector,
        F: Future<Output = ()>,
    {
        validate_config(&self.config)?;
        let token = self.config.token.as_deref().unwrap_or_default();

        let session = connector.connect(token).await?;
        let mut events = session.events;
        let host = Arc::new(BotHost::new(
            session.gateway,
            HostOptions {
                dispatch_mode: self.config.dispatch_mode,
                denial_policy: self.config.denial_policy,
                operators: self.config.operators.clone(),
            },
        ));

        // Kept alive for the whole session.
        let loader = host.extension_loader(Arc::clone(&self.source));
        let loaded = loader.load_all(&self.config.extensions).await;
        info!(
            loaded,
            requested = self.config.extensions.len(),
            handlers = host.chain().len(),
            "Extensions loaded"
        );

        info!("Bot is now running. Press CTRL-C to exit.");

        let quit = host.shutdown_token();
        tokio::pin!(shutdown);

        let reason = loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break StopReason::Signal,
                _ = quit.cancelled() => break StopReason::Quit,
                event = events.recv() => match event {
                    Some(event) => self.dispatch(&host, event).await,
                    None => {
                        info!("Gateway session ended");
                        break StopReason::SessionEnded;
                    }
                },
            }
        };

        // `!quit` has already closed the session.
        if reason != StopReason::Quit
            && let Err(e) = host.gateway().close().await
        {
            warn!(error = %e, "Error while closing gateway session");
        }

        info!(?reason, extensions = ?loader.loaded_names(), "Runtime stopped");
        Ok(reason)
    }

    async fn dispatch(&self, host: &Arc<BotHost>, event: MessageEvent) {
        let span = debug_span!(
            "dispatch",
            message_id = %event.id,
            author = %event.author.id,
            channel_id = %event.channel_id
        );
        let event = Arc::new(event);

        if self.config.concurrent_dispatch {
            let host = Arc::clone(host);
            tokio::spawn(async move { host.dispatch(event).await }.instrument(span));
        } else {
            host.dispatch(event).instrument(span).await;
        }
    }
}

/// Waits for shutdown signals (Ctrl+C or SIGTERM).
pub async fn wait_for_signal() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => {
                        info!("Received Ctrl+C, shutting down");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                if signal::ctrl_c().await.is_ok() {
                    info!("Received Ctrl+C, shutting down");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a `BotRuntime` with custom configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder searching the current directory.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir().with_user_config_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration file if one was given.
    pub fn config_file_opt<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        self.config_loader = self.config_loader.file_opt(path);
        self
    }

    /// Overrides the token.
    pub fn token(mut self, token: Option<String>) -> Self {
        self.config_loader = self.config_loader.token(token);
        self
    }

    /// Overrides the comma-separated operator list.
    pub fn operators(mut self, operators: Option<String>) -> Self {
        self.config_loader = self.config_loader.operators(operators);
        self
    }

    /// Overrides the comma-separated extension list.
    pub fn extensions(mut self, extensions: Option<String>) -> Self {
        self.config_loader = self.config_loader.extensions(extensions);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: BotConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads the configuration and builds the runtime.
    pub fn build(self) -> ConfigResult<BotRuntime> {
        let config = self.config_loader.load()?;
        Ok(BotRuntime::from_config(config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
