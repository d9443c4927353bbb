//! Runtime error types.

use discorrecd_core::{BoxError, DispatchError};
use thiserror::Error;

use crate::client::ClientError;
use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is incomplete.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A binding could not be registered.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The platform connection failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A module of the same type was already added.
    #[error("Module already added: {0}")]
    ModuleExists(&'static str),

    /// A module failed to build.
    #[error("Failed to initialize module {name}: {source}")]
    ModuleInit {
        name: &'static str,
        #[source]
        source: BoxError,
    },
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
