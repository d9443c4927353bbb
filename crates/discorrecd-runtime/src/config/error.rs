//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found at the specified path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// The file extension has no enabled format.
    #[error("Unsupported or disabled configuration file format: .{0}")]
    UnsupportedFormat(String),

    /// Figment failed to extract the configuration.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Neither a token nor a username and password are configured.
    #[error("No login credentials configured: set a token, or a username and password")]
    MissingCredentials,

    /// A module's config section does not match its schema.
    #[error("Invalid configuration for module {module}: {source}")]
    ModuleSection {
        module: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
