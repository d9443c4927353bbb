//! Configuration loading for the Discorrecd runtime.
//!
//! Layered figment loading into [`DiscorrecdConfig`], login [`Credentials`]
//! resolution and raw per-module sections.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, DEFAULT_CONFIG_DIR, Profile};
pub use schema::{
    Credentials, DiscorrecdConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig,
    SpanEventConfig,
};
