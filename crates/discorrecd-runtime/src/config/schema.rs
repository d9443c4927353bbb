//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};

/// Root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct DiscorrecdConfig {
    /// Bot token. Takes precedence over username and password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Account username, used together with `password` when no token is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Account password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Prefix that turns a message into a command.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    /// Directory modules read their data files from.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Raw per-module sections, keyed by module name.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

impl Default for DiscorrecdConfig {
    fn default() -> Self {
        Self {
            token: None,
            username: None,
            password: None,
            command_prefix: default_command_prefix(),
            data_dir: default_data_dir(),
            logging: LoggingConfig::default(),
            modules: HashMap::new(),
        }
    }
}

impl fmt::Debug for DiscorrecdConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |secret: &Option<String>| secret.as_ref().map(|_| "<redacted>");
        f.debug_struct("DiscorrecdConfig")
            .field("token", &redacted(&self.token))
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("command_prefix", &self.command_prefix)
            .field("data_dir", &self.data_dir)
            .field("logging", &self.logging)
            .field("modules", &self.modules)
            .finish()
    }
}

impl DiscorrecdConfig {
    /// Resolves the login credentials.
    ///
    /// A token wins over username and password. Fails with
    /// [`ConfigError::MissingCredentials`] when neither is complete.
    pub fn credentials(&self) -> ConfigResult<Credentials> {
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            return Ok(Credentials::Token(token.to_string()));
        }

        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(username), Some(password)) if !username.is_empty() => Ok(Credentials::Login {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }

    /// Returns the raw config section of a module, or `Null` if absent.
    pub fn module_section(&self, name: &str) -> serde_json::Value {
        self.modules
            .get(name)
            .cloned()
            .unwrap_or(serde_json::Value::Null)
    }

    /// Deserializes the config section of a module.
    ///
    /// An absent section yields `T::default()`.
    pub fn module_config<T>(&self, name: &str) -> ConfigResult<T>
    where
        T: DeserializeOwned + Default,
    {
        deserialize_section(name, self.module_section(name))
    }
}

pub(crate) fn deserialize_section<T>(name: &str, section: serde_json::Value) -> ConfigResult<T>
where
    T: DeserializeOwned + Default,
{
    if section.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(section).map_err(|source| ConfigError::ModuleSection {
        module: name.to_string(),
        source,
    })
}

fn default_command_prefix() -> String {
    ".".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Login credentials handed to a connector.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Bot token login.
    Token(String),
    /// Username and password login.
    Login { username: String, password: String },
}

impl Credentials {
    /// Returns a short label for logging; never includes secrets.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Token(_) => "token",
            Self::Login { .. } => "login",
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
            Self::Login { username, .. } => f
                .debug_struct("Login")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Directory for log files when `output` includes files.
    #[serde(default = "default_log_dir")]
    pub directory: PathBuf,

    /// How often log files are rotated.
    #[serde(default)]
    pub rotation: LogRotation,

    /// Include thread ids in log lines.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line in log lines.
    #[serde(default)]
    pub file_location: bool,

    /// Span lifecycle events to log.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Per-target level overrides.
    #[serde(default = "default_filters")]
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            directory: default_log_dir(),
            rotation: LogRotation::default(),
            thread_ids: false,
            file_location: false,
            span_events: SpanEventConfig::default(),
            filters: default_filters(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("log")
}

// Network stacks log every frame at debug.
fn default_filters() -> HashMap<String, LogLevel> {
    ["hyper", "reqwest", "tungstenite", "tokio_tungstenite"]
        .into_iter()
        .map(|target| (target.to_string(), LogLevel::Warn))
        .collect()
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
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
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// `debug.log` and `info.log` in the log directory.
    File,
    /// Stdout plus the two log files.
    Both,
}

impl LogOutput {
    /// Returns `true` if log files are written.
    pub fn writes_files(self) -> bool {
        matches!(self, Self::File | Self::Both)
    }
}

/// Log file rotation period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Never,
    Hourly,
    #[default]
    Daily,
}

/// Span lifecycle events to log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_wins_over_login() {
        let config = DiscorrecdConfig {
            token: Some("abc".into()),
            username: Some("bot".into()),
            password: Some("hunter2".into()),
            ..Default::default()
        };
        assert_eq!(config.credentials().unwrap(), Credentials::Token("abc".into()));
    }

    #[test]
    fn test_login_requires_both_fields() {
        let mut config = DiscorrecdConfig {
            username: Some("bot".into()),
            ..Default::default()
        };
        assert!(matches!(
            config.credentials(),
            Err(ConfigError::MissingCredentials)
        ));

        config.password = Some("hunter2".into());
        assert_eq!(config.credentials().unwrap().kind(), "login");
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = Credentials::Login {
            username: "bot".into(),
            password: "hunter2".into(),
        };
        let printed = format!("{creds:?}");
        assert!(printed.contains("bot"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_config_debug_is_redacted() {
        let config = DiscorrecdConfig {
            token: Some("s3cr3t-token".into()),
            username: Some("bot".into()),
            password: Some("hunter2".into()),
            ..Default::default()
        };
        let printed = format!("{config:?}");
        assert!(printed.contains("bot"));
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("s3cr3t-token"));
        assert!(!printed.contains("hunter2"));
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Section {
        #[serde(default)]
        prefix: String,
    }

    #[test]
    fn test_module_config_sections() {
        let mut config = DiscorrecdConfig::default();
        assert_eq!(config.module_config::<Section>("absent").unwrap(), Section::default());

        config
            .modules
            .insert("emoticons".into(), json!({ "prefix": "/" }));
        assert_eq!(
            config.module_config::<Section>("emoticons").unwrap().prefix,
            "/"
        );

        config.modules.insert("broken".into(), json!({ "prefix": 3 }));
        assert!(matches!(
            config.module_config::<Section>("broken"),
            Err(ConfigError::ModuleSection { ref module, .. }) if module == "broken"
        ));
    }

    #[test]
    fn test_default_filters_quiet_network_crates() {
        let logging = LoggingConfig::default();
        assert_eq!(logging.filters.get("tungstenite"), Some(&LogLevel::Warn));
        assert_eq!(logging.level, LogLevel::Info);
        assert!(!logging.output.writes_files());
    }
}
