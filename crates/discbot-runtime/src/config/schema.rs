//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use discbot_framework::{DenialPolicy, DispatchMode};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BotConfig {
    /// Gateway authentication token. Required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Initial operator ids. Accepts a list or a comma-separated string.
    #[serde(default, deserialize_with = "string_or_list")]
    pub operators: Vec<String>,

    /// Extension descriptors (`path?arg?arg`). Accepts a list or a
    /// comma-separated string.
    #[serde(default, deserialize_with = "string_or_list")]
    pub extensions: Vec<String>,

    /// Handler chain discipline.
    #[serde(default)]
    pub dispatch_mode: DispatchMode,

    /// What a non-operator sees when invoking a privileged command.
    #[serde(default)]
    pub denial_policy: DenialPolicy,

    /// Dispatch each inbound message on its own task.
    #[serde(default)]
    pub concurrent_dispatch: bool,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Console gateway settings.
    #[serde(default)]
    pub console: ConsoleConfig,
}

/// Splits a comma-separated list, trimming entries and skipping blanks.
pub fn split_operators(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        One(String),
        // Environment values that look numeric arrive as integers.
        Id(u64),
        Many(Vec<String>),
    }

    Ok(match Repr::deserialize(deserializer)? {
        Repr::One(s) => split_operators(&s),
        Repr::Id(id) => vec![id.to_string()],
        Repr::Many(v) => v
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    })
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing::Level`.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Log destination.
///
/// Defaults to stderr: the console gateway owns stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    #[default]
    Stderr,
    File,
}

/// Log file rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level. `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,

    /// Log file path, used when `output = "file"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    /// Per-module levels, e.g. `discbot_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

// =============================================================================
// Console gateway
// =============================================================================

/// Settings for the console gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// User id the bot speaks as.
    #[serde(default = "default_bot_id")]
    pub bot_id: String,

    /// Users known before any message arrives.
    #[serde(default, deserialize_with = "string_or_list")]
    pub users: Vec<String>,

    /// Channels known before any message arrives.
    #[serde(default, deserialize_with = "string_or_list")]
    pub channels: Vec<String>,

    /// Capacity of the inbound event queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            bot_id: default_bot_id(),
            users: Vec::new(),
            channels: Vec::new(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_bot_id() -> String {
    "discbot".to_string()
}

fn default_queue_capacity() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators_accept_string_or_list() {
        let cfg: BotConfig = serde_json::from_str(r#"{"operators": "a, b,,c"}"#).unwrap();
        assert_eq!(cfg.operators, vec!["a", "b", "c"]);

        let cfg: BotConfig = serde_json::from_str(r#"{"operators": ["a", " ", "b"]}"#).unwrap();
        assert_eq!(cfg.operators, vec!["a", "b"]);

        let cfg: BotConfig = serde_json::from_str(r#"{"operators": 42}"#).unwrap();
        assert_eq!(cfg.operators, vec!["42"]);
    }

    #[test]
    fn test_defaults() {
        let cfg: BotConfig = serde_json::from_str("{}").unwrap();
        assert!(cfg.token.is_none());
        assert_eq!(cfg.dispatch_mode, DispatchMode::SelfPruning);
        assert_eq!(cfg.denial_policy, DenialPolicy::Notify);
        assert!(!cfg.concurrent_dispatch);
        assert_eq!(cfg.logging.output, LogOutput::Stderr);
        assert_eq!(cfg.console.bot_id, "discbot");
    }

    #[test]
    fn test_split_operators() {
        assert!(split_operators("").is_empty());
        assert_eq!(split_operators(" x ,y"), vec!["x", "y"]);
    }
}
