//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: enables TOML configuration files (`discbot.toml`, `config.toml`)
//! - `yaml-config`: enables YAML configuration files (`discbot.yaml`, `discbot.yml`, etc.)
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Config file (`discbot.toml` / `discbot.yaml`), or the file given to [`ConfigLoader::file`]
//! 3. Environment variables (`DISCBOT_*`)
//! 4. Legacy environment variables (`DISCORDTOKEN`, `TBOPS`)
//! 5. Programmatic overrides (command-line flags)
//!
//! # Environment Variable Mapping
//!
//! Environment variables are mapped using the `DISCBOT_` prefix with `__` as separator:
//!
//! - `DISCBOT_TOKEN=xxx` → `token = "xxx"`
//! - `DISCBOT_OPERATORS=1,2` → `operators = ["1", "2"]`
//! - `DISCBOT_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//!
//! # Example
//!
//! ```rust,ignore
//! use discbot_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("./discbot.toml")
//!     .token(cli.token)
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace};

use super::error::{ConfigError, ConfigResult};
use super::schema::BotConfig;

/// Legacy variable holding the gateway token.
pub const LEGACY_TOKEN_VAR: &str = "DISCORDTOKEN";

/// Legacy variable holding the comma-separated operator list.
pub const LEGACY_OPERATORS_VAR: &str = "TBOPS";

/// Values set on the command line. `None` leaves lower layers untouched.
#[derive(Debug, Clone, Default)]
struct Overrides {
    token: Option<String>,
    operators: Option<String>,
    extensions: Option<String>,
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Base figment instance.
    figment: Figment,
    /// Search paths for configuration files.
    search_paths: Vec<PathBuf>,
    /// Whether to load `DISCBOT_*` environment variables.
    load_env: bool,
    /// Whether to load `DISCORDTOKEN` and `TBOPS`.
    load_legacy_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
    overrides: Overrides,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            search_paths: Vec::new(),
            load_env: true,
            load_legacy_env: true,
            config_file: None,
            overrides: Overrides::default(),
        }
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds current directory to search paths.
    pub fn with_current_dir(self) -> Self {
        if let Ok(cwd) = std::env::current_dir() {
            self.search_path(cwd)
        } else {
            self
        }
    }

    /// Adds user config directory to search paths.
    pub fn with_user_config_dir(self) -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            self.search_path(config_dir.join("discbot"))
        } else {
            self
        }
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration file if `path` is `Some`.
    pub fn file_opt<P: AsRef<Path>>(self, path: Option<P>) -> Self {
        match path {
            Some(p) => self.file(p),
            None => self,
        }
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self.load_legacy_env = true;
        self
    }

    /// Disables loading all environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self.load_legacy_env = false;
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: BotConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Overrides the token.
    pub fn token(mut self, token: Option<String>) -> Self {
        if token.is_some() {
            self.overrides.token = token;
        }
        self
    }

    /// Overrides the operator list (comma-separated).
    pub fn operators(mut self, operators: Option<String>) -> Self {
        if operators.is_some() {
            self.overrides.operators = operators;
        }
        self
    }

    /// Overrides the extension list (comma-separated descriptors).
    pub fn extensions(mut self, extensions: Option<String>) -> Self {
        if extensions.is_some() {
            self.overrides.extensions = extensions;
        }
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<BotConfig> {
        let figment = self.build_figment()?;
        let config: BotConfig = figment.extract()?;

        debug!(
            operators = config.operators.len(),
            extensions = config.extensions.len(),
            logging_level = %config.logging.level,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Builds the figment instance with all sources.
    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(BotConfig::default()));

        let user_figment = std::mem::take(&mut self.figment);
        figment = figment.merge(user_figment);

        if let Some(path) = self.config_file.take() {
            if path.exists() {
                info!(path = %path.display(), "Loading configuration file");
                figment = Self::merge_config_file(figment, &path)?;
            } else {
                return Err(ConfigError::FileNotFound(path));
            }
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with DISCBOT_ prefix");
            figment = figment.merge(Env::prefixed("DISCBOT_").split("__"));
        }

        if self.load_legacy_env {
            if let Some(token) = non_empty_var(LEGACY_TOKEN_VAR) {
                figment = figment.merge(Serialized::default("token", token));
            }
            if let Ok(ops) = std::env::var(LEGACY_OPERATORS_VAR) {
                figment = figment.merge(Serialized::default("operators", ops));
            }
        }

        let Overrides {
            token,
            operators,
            extensions,
        } = self.overrides;
        if let Some(token) = token {
            figment = figment.merge(Serialized::default("token", token));
        }
        if let Some(ops) = operators {
            figment = figment.merge(Serialized::default("operators", ops));
        }
        if let Some(exts) = extensions {
            figment = figment.merge(Serialized::default("extensions", exts));
        }

        Ok(figment)
    }

    /// Merges a single config file into the figment, dispatching on file extension.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
            _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if self.search_paths.is_empty() {
            let mut paths = Vec::new();
            if let Ok(cwd) = std::env::current_dir() {
                paths.push(cwd);
            }
            if let Some(config_dir) = dirs::config_dir() {
                paths.push(config_dir.join("discbot"));
            }
            paths
        } else {
            self.search_paths.clone()
        }
    }

    /// Merges the first file found among `search_paths × base_names`.
    #[cfg(any(feature = "toml-config", feature = "yaml-config"))]
    fn load_format_files<F>(
        figment: Figment,
        search_paths: &[PathBuf],
        base_names: &[&str],
        merge_fn: F,
    ) -> (Figment, bool)
    where
        F: Fn(Figment, &Path) -> Figment,
    {
        for search_path in search_paths {
            for base_name in base_names {
                let path = search_path.join(base_name);
                if path.exists() {
                    info!(path = %path.display(), "Loading configuration file");
                    return (merge_fn(figment, &path), true);
                }
            }
        }
        (figment, false)
    }

    #[allow(unused_mut)]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        let search_paths = self.resolve_search_paths();
        let mut found = false;

        #[cfg(feature = "toml-config")]
        {
            let (f, ok) = Self::load_format_files(
                figment,
                &search_paths,
                &["discbot.toml", "config.toml"],
                |fig, path| fig.merge(Toml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        #[cfg(feature = "yaml-config")]
        {
            let (f, ok) = Self::load_format_files(
                figment,
                &search_paths,
                &["discbot.yaml", "discbot.yml", "config.yaml", "config.yml"],
                |fig, path| fig.merge(Yaml::file(path)),
            );
            figment = f;
            found |= ok;
        }

        if !found {
            debug!("No configuration file found, using defaults and environment");
        }
        figment
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<BotConfig> {
    ConfigLoader::new().with_current_dir().load()
}

// =============================================================================
// Tests
// =============================================================================
