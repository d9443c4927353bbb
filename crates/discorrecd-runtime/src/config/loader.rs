//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Profile-specific config file (`discorrecd.{profile}.toml`)
//! 3. Main config file (`discorrecd.toml`, `config.toml` or `config.json`)
//! 4. Environment variables (`DISCORRECD_*`)
//! 5. Programmatic overrides
//!
//! Files are looked up in the config directory, which is always an explicit
//! value (`./config` unless set), never derived from the binary's location.
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `DISCORRECD_` prefix with `__` as separator:
//!
//! - `DISCORRECD_TOKEN=xxx` → `token = "xxx"`
//! - `DISCORRECD_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `DISCORRECD_MODULES__EMOTICONS__PREFIX=/` → `modules.emoticons.prefix = "/"`
//!
//! # Example
//!
//! ```rust,ignore
//! use discorrecd_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .config_dir("./config")
//!     .file("config.json")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(feature = "json-config")]
use figment::providers::Json;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(any(feature = "toml-config", feature = "json-config"))]
use figment::providers::Format;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::DiscorrecdConfig;

/// Default config directory, relative to the working directory.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// File names searched when no explicit file is set, in order.
const SEARCHED_FILES: &[&str] = &["discorrecd.toml", "config.toml", "config.json"];

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads `DISCORRECD_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var("DISCORRECD_PROFILE")
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    figment: Figment,
    profile: Profile,
    config_dir: PathBuf,
    extra_dirs: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader reading from `./config` and the environment.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            extra_dirs: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Sets the config directory.
    pub fn config_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_dir = path.as_ref().to_path_buf();
        self
    }

    /// Returns the config directory.
    pub fn dir(&self) -> &Path {
        &self.config_dir
    }

    /// Searches `dir` for the default files after the directories already
    /// registered.
    pub fn search_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.extra_dirs.push(dir.as_ref().to_path_buf());
        self
    }

    /// Also searches `<user config dir>/discorrecd` after the config directory.
    pub fn with_user_config_dir(self) -> Self {
        match dirs::config_dir() {
            Some(dir) => self.search_dir(dir.join("discorrecd")),
            None => self,
        }
    }

    /// Sets a specific configuration file to load.
    ///
    /// Relative paths are resolved against the config directory. A missing
    /// file is an error, unlike the searched defaults.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Builds the path of a file inside the config directory.
    ///
    /// The path is not checked for existence.
    pub fn config_path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.config_dir.join(name)
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges additional configuration programmatically.
    ///
    /// Merged values take precedence over files and environment variables.
    pub fn merge(mut self, config: DiscorrecdConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Merges a single key programmatically, e.g. `("logging.level", "debug")`.
    pub fn set<V: serde::Serialize>(mut self, key: &str, value: V) -> Self {
        self.figment = self.figment.merge(Serialized::default(key, value));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<DiscorrecdConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: DiscorrecdConfig = figment.extract().map_err(|e| {
            ConfigError::ParseError(format!("Failed to extract configuration: {e}"))
        })?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            modules = config.modules.len(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(DiscorrecdConfig::default()));

        if let Some(path) = self.config_file.take() {
            let path = self.config_dir.join(path);
            if !path.is_file() {
                return Err(ConfigError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = Self::merge_config_file(figment, &path)?;
        } else {
            figment = self.load_config_files(figment)?;
        }

        if self.load_env {
            trace!("Loading environment variables with DISCORRECD_ prefix");
            figment = figment.merge(
                Env::prefixed("DISCORRECD_")
                    .ignore(&["PROFILE"])
                    .split("__"),
            );
        }

        // Programmatic overrides are applied last.
        let user_figment = std::mem::take(&mut self.figment);
        Ok(figment.merge(user_figment))
    }

    /// Merges a single config file into the figment, dispatching on file extension.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "json-config")]
            "json" => Ok(figment.merge(Json::file(path))),
            _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
        }
    }

    /// Loads the first searched file found, preceded by its profile variant.
    fn load_config_files(&self, mut figment: Figment) -> ConfigResult<Figment> {
        let dirs = std::iter::once(&self.config_dir).chain(&self.extra_dirs);

        for dir in dirs {
            for name in SEARCHED_FILES {
                let base = dir.join(name);
                if !base.is_file() {
                    continue;
                }

                let profiled = base.with_extension(format!(
                    "{}.{}",
                    self.profile.as_str(),
                    base.extension().and_then(|e| e.to_str()).unwrap_or_default()
                ));
                if profiled.is_file() {
                    debug!(path = %profiled.display(), "Loading profile-specific config");
                    figment = Self::merge_config_file(figment, &profiled)?;
                }

                info!(path = %base.display(), "Loading configuration file");
                return Self::merge_config_file(figment, &base);
            }
        }

        warn!(dir = %self.config_dir.display(), "No configuration file found, using defaults");
        Ok(figment)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "discorrecd-config-{}-{}",
            std::process::id(),
            NEXT_DIR.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_default_config() {
        let config = ConfigLoader::new()
            .config_dir(scratch_dir())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.logging.level.as_str(), "info");
        assert_eq!(config.command_prefix, ".");
        assert!(config.token.is_none());
    }

    #[cfg(feature = "json-config")]
    #[test]
    fn test_loads_json_file() {
        let dir = scratch_dir();
        std::fs::write(
            dir.join("config.json"),
            r#"{ "token": "abc", "command_prefix": "!", "modules": { "test": { "greeting": "hi" } } }"#,
        )
        .unwrap();

        let config = ConfigLoader::new()
            .config_dir(&dir)
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.token.as_deref(), Some("abc"));
        assert_eq!(config.command_prefix, "!");
        assert_eq!(config.modules["test"]["greeting"], "hi");
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_profile_file_is_overridden_by_base() {
        let dir = scratch_dir();
        std::fs::write(
            dir.join("discorrecd.production.toml"),
            "command_prefix = \"?\"\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();
        std::fs::write(dir.join("discorrecd.toml"), "command_prefix = \"!\"\n").unwrap();

        let config = ConfigLoader::new()
            .config_dir(&dir)
            .profile("prod")
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.command_prefix, "!");
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let dir = scratch_dir();
        let err = ConfigLoader::new()
            .config_dir(&dir)
            .file("nope.json")
            .without_env()
            .load()
            .unwrap_err();

        assert!(matches!(err, ConfigError::FileNotFound(ref p) if p == &dir.join("nope.json")));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = scratch_dir();
        std::fs::write(dir.join("config.ini"), "token=abc").unwrap();

        let err = ConfigLoader::new()
            .config_dir(&dir)
            .file("config.ini")
            .without_env()
            .load()
            .unwrap_err();

        assert!(matches!(err, ConfigError::UnsupportedFormat(ref ext) if ext == "ini"));
    }

    #[test]
    fn test_programmatic_overrides_win() {
        let config = ConfigLoader::new()
            .config_dir(scratch_dir())
            .without_env()
            .set("command_prefix", "$")
            .set("logging.level", "debug")
            .load()
            .unwrap();

        assert_eq!(config.command_prefix, "$");
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[cfg(feature = "json-config")]
    #[test]
    fn test_search_dirs_follow_config_dir() {
        let fallback = scratch_dir();
        std::fs::write(fallback.join("config.json"), r#"{ "command_prefix": "%" }"#).unwrap();

        let config = ConfigLoader::new()
            .config_dir(scratch_dir())
            .search_dir(&fallback)
            .without_env()
            .load()
            .unwrap();
        assert_eq!(config.command_prefix, "%");

        let primary = scratch_dir();
        std::fs::write(primary.join("config.json"), r#"{ "command_prefix": "!" }"#).unwrap();
        let config = ConfigLoader::new()
            .config_dir(&primary)
            .search_dir(&fallback)
            .without_env()
            .load()
            .unwrap();
        assert_eq!(config.command_prefix, "!");
    }

    #[test]
    fn test_user_config_dir_is_searched() {
        let loader = ConfigLoader::new().with_user_config_dir();
        let expected: Vec<PathBuf> = dirs::config_dir()
            .map(|dir| dir.join("discorrecd"))
            .into_iter()
            .collect();
        assert_eq!(loader.extra_dirs, expected);
    }

    #[test]
    fn test_config_path_does_not_validate() {
        let loader = ConfigLoader::new().config_dir("/etc/discorrecd");
        assert_eq!(
            loader.config_path("config.json"),
            PathBuf::from("/etc/discorrecd/config.json")
        );
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging").as_str(), "staging");
    }
}
