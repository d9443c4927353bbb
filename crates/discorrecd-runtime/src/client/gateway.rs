//! Boundary between the runtime and a chat platform connection.
//!
//! A [`Connector`] logs in and yields a [`Connection`]: a [`Gateway`] for
//! outbound actions and an [`EventSource`] the client loop drains.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Credentials;
use crate::payload::{Message, Payload, TextChannel, User};

/// Channel emitted when the client logged in.
pub const READY: &str = "ready";
/// Channel emitted when a dropped connection resumed.
pub const RESUMED: &str = "resumed";
/// Channel emitted for every posted message.
pub const MESSAGE: &str = "message";
/// Channel emitted when a message is deleted.
pub const MESSAGE_DELETE: &str = "message_delete";
/// Channel emitted when a message is edited.
pub const MESSAGE_EDIT: &str = "message_edit";
/// Channel emitted when a user starts typing.
pub const TYPING: &str = "typing";
/// Channel emitted when another emission failed.
pub const CLIENT_ERROR: &str = "client_error";

/// Every channel the client registers on the events dispatcher.
pub const HOOKED_EVENTS: &[&str] = &[
    READY,
    RESUMED,
    MESSAGE,
    MESSAGE_DELETE,
    MESSAGE_EDIT,
    TYPING,
    CLIENT_ERROR,
];

/// Errors raised by platform connections.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The platform rejected the credentials.
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// No connection is attached to the client.
    #[error("client is not connected")]
    NotConnected,

    /// The connection dropped.
    #[error("connection closed: {reason}")]
    ConnectionClosed { reason: String },

    /// An outbound action failed.
    #[error("{action} failed: {reason}")]
    ActionFailed { action: &'static str, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Creates an action failure.
    pub fn action(action: &'static str, reason: impl Into<String>) -> Self {
        Self::ActionFailed {
            action,
            reason: reason.into(),
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// An inbound platform event, before it is mapped to a channel.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    Ready { user: User },
    Resumed,
    MessageCreate(Message),
    MessageDelete(Message),
    MessageUpdate { before: Message, after: Message },
    TypingStart { channel: TextChannel, user: User },
}

impl PlatformEvent {
    /// Returns the events channel this event is emitted on.
    pub fn channel_name(&self) -> &'static str {
        match self {
            Self::Ready { .. } => READY,
            Self::Resumed => RESUMED,
            Self::MessageCreate(_) => MESSAGE,
            Self::MessageDelete(_) => MESSAGE_DELETE,
            Self::MessageUpdate { .. } => MESSAGE_EDIT,
            Self::TypingStart { .. } => TYPING,
        }
    }

    /// Converts the event into the payload handlers receive.
    pub fn into_payload(self) -> Payload {
        match self {
            Self::Ready { user } => Payload::Ready(user),
            Self::Resumed => Payload::Resumed,
            Self::MessageCreate(m) => Payload::Message(m),
            Self::MessageDelete(m) => Payload::MessageDelete(m),
            Self::MessageUpdate { before, after } => Payload::MessageEdit { before, after },
            Self::TypingStart { channel, user } => Payload::Typing { channel, user },
        }
    }
}

/// Outbound actions on a live connection.
#[async_trait]
pub trait Gateway: Send + Sync + 'static {
    /// Returns the account the connection is logged in as.
    fn current_user(&self) -> User;

    /// Posts a text message.
    async fn send_message(&self, channel: &TextChannel, content: &str) -> ClientResult<Message>;

    /// Deletes a message.
    async fn delete_message(&self, message: &Message) -> ClientResult<()>;

    /// Uploads a file with optional accompanying text.
    async fn send_file(
        &self,
        channel: &TextChannel,
        path: &Path,
        content: Option<&str>,
    ) -> ClientResult<Message>;
}

/// Shared gateway handle.
pub type BoxedGateway = Arc<dyn Gateway>;

/// Stream of inbound platform events.
#[async_trait]
pub trait EventSource: Send + 'static {
    /// Waits for the next event; `None` once the connection has ended.
    async fn next_event(&mut self) -> Option<ClientResult<PlatformEvent>>;
}

/// A logged-in connection.
pub struct Connection {
    pub gateway: BoxedGateway,
    pub events: Box<dyn EventSource>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("user", &self.gateway.current_user())
            .finish_non_exhaustive()
    }
}

/// Logs in to a platform.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Authenticates and opens a connection.
    async fn connect(&self, credentials: &Credentials) -> ClientResult<Connection>;
}
