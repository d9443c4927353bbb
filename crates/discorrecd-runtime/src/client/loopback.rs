//! In-memory platform connection.
//!
//! [`LoopbackConnector`] accepts any credentials and hands out a connection
//! whose inbound events are pushed through a [`LoopbackHandle`] and whose
//! outbound actions are recorded by a [`LoopbackGateway`]. The connection
//! starts with a `ready` event and ends once every handle is dropped.
//!
//! ```rust,ignore
//! let (connector, handle) = LoopbackConnector::new(User::new(1, "bot"));
//! handle.say(&general, handle.user(), ".testme");
//! drop(handle);
//!
//! core.start(&connector).await?;
//! assert_eq!(connector.gateway().actions().len(), 1);
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use super::gateway::{
    BoxedGateway, ClientError, ClientResult, Connection, Connector, EventSource, Gateway,
    PlatformEvent,
};
use crate::config::Credentials;
use crate::payload::{Message, TextChannel, User};

const OUTBOUND_CAPACITY: usize = 64;

/// An outbound action recorded by a [`LoopbackGateway`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SendMessage {
        channel: TextChannel,
        content: String,
    },
    DeleteMessage {
        message: Message,
    },
    SendFile {
        channel: TextChannel,
        path: PathBuf,
        content: Option<String>,
    },
}

/// Gateway recording every outbound action.
pub struct LoopbackGateway {
    user: User,
    next_id: AtomicU64,
    actions: Mutex<Vec<Action>>,
    outbound: broadcast::Sender<Action>,
}

impl LoopbackGateway {
    pub fn new(user: User) -> Self {
        let (outbound, _) = broadcast::channel(OUTBOUND_CAPACITY);
        Self {
            user,
            next_id: AtomicU64::new(1),
            actions: Mutex::new(Vec::new()),
            outbound,
        }
    }

    /// Returns every action recorded so far.
    pub fn actions(&self) -> Vec<Action> {
        self.actions.lock().clone()
    }

    /// Returns and forgets the recorded actions.
    pub fn take_actions(&self) -> Vec<Action> {
        std::mem::take(&mut *self.actions.lock())
    }

    /// Subscribes to actions recorded from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Action> {
        self.outbound.subscribe()
    }

    /// Allocates a message id.
    pub fn next_message_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn record(&self, action: Action) {
        self.actions.lock().push(action.clone());
        // No subscriber is fine.
        let _ = self.outbound.send(action);
    }

    fn own_message(&self, channel: &TextChannel, content: &str) -> Message {
        Message {
            id: self.next_message_id(),
            author: self.user.clone(),
            channel: channel.clone(),
            content: content.to_string(),
        }
    }
}

#[async_trait]
impl Gateway for LoopbackGateway {
    fn current_user(&self) -> User {
        self.user.clone()
    }

    async fn send_message(&self, channel: &TextChannel, content: &str) -> ClientResult<Message> {
        self.record(Action::SendMessage {
            channel: channel.clone(),
            content: content.to_string(),
        });
        Ok(self.own_message(channel, content))
    }

    async fn delete_message(&self, message: &Message) -> ClientResult<()> {
        self.record(Action::DeleteMessage {
            message: message.clone(),
        });
        Ok(())
    }

    async fn send_file(
        &self,
        channel: &TextChannel,
        path: &Path,
        content: Option<&str>,
    ) -> ClientResult<Message> {
        if !std::fs::metadata(path)?.is_file() {
            return Err(ClientError::action(
                "send_file",
                format!("{} is not a file", path.display()),
            ));
        }

        self.record(Action::SendFile {
            channel: channel.clone(),
            path: path.to_path_buf(),
            content: content.map(str::to_string),
        });
        Ok(self.own_message(channel, content.unwrap_or_default()))
    }
}

/// Inbound side of a loopback connection.
pub struct LoopbackSource {
    ready: Option<User>,
    rx: mpsc::UnboundedReceiver<ClientResult<PlatformEvent>>,
}

#[async_trait]
impl EventSource for LoopbackSource {
    async fn next_event(&mut self) -> Option<ClientResult<PlatformEvent>> {
        if let Some(user) = self.ready.take() {
            return Some(Ok(PlatformEvent::Ready { user }));
        }
        self.rx.recv().await
    }
}

/// Pushes inbound events into a loopback connection.
#[derive(Clone)]
pub struct LoopbackHandle {
    tx: mpsc::UnboundedSender<ClientResult<PlatformEvent>>,
    gateway: Arc<LoopbackGateway>,
}

impl LoopbackHandle {
    /// Queues an event. Returns `false` once the connection has ended.
    pub fn push(&self, event: PlatformEvent) -> bool {
        self.tx.send(Ok(event)).is_ok()
    }

    /// Queues a connection failure, which ends the client loop.
    pub fn fail(&self, error: ClientError) -> bool {
        self.tx.send(Err(error)).is_ok()
    }

    /// Queues a new message and returns it.
    pub fn say(&self, channel: &TextChannel, author: &User, content: &str) -> Message {
        let message = Message {
            id: self.gateway.next_message_id(),
            author: author.clone(),
            channel: channel.clone(),
            content: content.to_string(),
        };
        self.push(PlatformEvent::MessageCreate(message.clone()));
        message
    }

    /// Returns the account the connection is logged in as.
    pub fn user(&self) -> &User {
        &self.gateway.user
    }

    /// Returns the recording gateway.
    pub fn gateway(&self) -> &Arc<LoopbackGateway> {
        &self.gateway
    }
}

/// Connector producing one loopback connection.
pub struct LoopbackConnector {
    gateway: Arc<LoopbackGateway>,
    source: Mutex<Option<LoopbackSource>>,
}

impl LoopbackConnector {
    /// Creates a connector logged in as `user` and the handle feeding it.
    pub fn new(user: User) -> (Self, LoopbackHandle) {
        let gateway = Arc::new(LoopbackGateway::new(user));
        let (tx, rx) = mpsc::unbounded_channel();
        let connector = Self {
            gateway: Arc::clone(&gateway),
            source: Mutex::new(Some(LoopbackSource { ready: None, rx })),
        };
        (connector, LoopbackHandle { tx, gateway })
    }

    /// Returns the recording gateway.
    pub fn gateway(&self) -> &Arc<LoopbackGateway> {
        &self.gateway
    }
}

#[async_trait]
impl Connector for LoopbackConnector {
    async fn connect(&self, credentials: &Credentials) -> ClientResult<Connection> {
        let mut source = self
            .source
            .lock()
            .take()
            .ok_or_else(|| ClientError::LoginFailed("loopback connection already used".into()))?;

        debug!(credentials = credentials.kind(), user = %self.gateway.user, "Loopback login");
        source.ready = Some(self.gateway.current_user());

        let gateway: BoxedGateway = self.gateway.clone();
        Ok(Connection {
            gateway,
            events: Box::new(source),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bot() -> User {
        User::new(1, "bot")
    }

    #[tokio::test]
    async fn test_connection_starts_with_ready() {
        let (connector, handle) = LoopbackConnector::new(bot());
        let general = TextChannel::new(5, "general");
        handle.say(&general, &User::new(2, "alice"), "hello");
        drop(handle);

        let mut conn = connector
            .connect(&Credentials::Token("t".into()))
            .await
            .unwrap();

        assert!(matches!(
            conn.events.next_event().await,
            Some(Ok(PlatformEvent::Ready { ref user })) if user == &bot()
        ));
        assert!(matches!(
            conn.events.next_event().await,
            Some(Ok(PlatformEvent::MessageCreate(ref m))) if m.content == "hello"
        ));
        assert!(conn.events.next_event().await.is_none());
    }

    #[tokio::test]
    async fn test_second_connect_fails() {
        let (connector, _handle) = LoopbackConnector::new(bot());
        let creds = Credentials::Token("t".into());
        connector.connect(&creds).await.unwrap();
        assert!(matches!(
            connector.connect(&creds).await,
            Err(ClientError::LoginFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_gateway_records_actions() {
        let gateway = LoopbackGateway::new(bot());
        let mut rx = gateway.subscribe();
        let general = TextChannel::new(5, "general");

        let sent = gateway.send_message(&general, "hi").await.unwrap();
        gateway.delete_message(&sent).await.unwrap();

        assert_eq!(sent.author, bot());
        assert_eq!(
            rx.recv().await.unwrap(),
            Action::SendMessage {
                channel: general.clone(),
                content: "hi".into()
            }
        );
        assert_eq!(gateway.take_actions().len(), 2);
        assert!(gateway.actions().is_empty());
    }

    #[tokio::test]
    async fn test_send_missing_file_fails() {
        let gateway = LoopbackGateway::new(bot());
        let err = gateway
            .send_file(
                &TextChannel::new(5, "general"),
                Path::new("/definitely/not/here.png"),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Io(_)));
        assert!(gateway.actions().is_empty());
    }
}
