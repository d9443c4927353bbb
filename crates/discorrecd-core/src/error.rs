//! Error types for the dispatch core.

use thiserror::Error;

use crate::handler::HandlerId;

/// A boxed, thread-safe error returned by handler callables.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by [`Channel`](crate::Channel), [`Dispatcher`](crate::Dispatcher)
/// and [`Binding`](crate::Binding) operations.
///
/// The first three variants are registry-shape errors and are returned
/// synchronously by the mutating operation. [`DispatchError::Handler`] carries
/// a failure raised by a handler during emission; it is never swallowed.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A value could not be turned into a handler.
    #[error("invalid handler: {reason}")]
    InvalidHandler {
        /// Why the value was rejected.
        reason: String,
    },

    /// The channel was never added to the dispatcher.
    #[error("event '{name}' doesn't exist or hasn't been registered to this dispatcher")]
    ChannelNotFound {
        /// The requested channel name.
        name: String,
    },

    /// A different channel with the same name is already registered.
    #[error("event '{name}' already exists and cannot be added again")]
    DuplicateChannel {
        /// The conflicting channel name.
        name: String,
    },

    /// A handler failed while the channel was being emitted.
    #[error("handler {handler} on event '{channel}' failed: {source}")]
    Handler {
        /// The channel whose chain was aborted.
        channel: String,
        /// The failing handler.
        handler: HandlerId,
        /// The error returned by the handler.
        #[source]
        source: BoxError,
    },
}

impl DispatchError {
    /// Creates an [`DispatchError::InvalidHandler`] error.
    pub fn invalid_handler(reason: impl Into<String>) -> Self {
        Self::InvalidHandler {
            reason: reason.into(),
        }
    }

    /// Creates a [`DispatchError::ChannelNotFound`] error.
    pub fn channel_not_found(name: impl Into<String>) -> Self {
        Self::ChannelNotFound { name: name.into() }
    }

    /// Returns `true` if this error was raised by a handler rather than by
    /// the registry itself.
    pub fn is_handler_failure(&self) -> bool {
        matches!(self, Self::Handler { .. })
    }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
