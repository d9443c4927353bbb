//! Network-client glue.
//!
//! [`CoreClient`] sits between a platform [`Connection`] and the events
//! [`Dispatcher`]. It registers the channel names it emits on at construction,
//! turns each inbound [`PlatformEvent`] into one emission, and exposes the
//! connection's outbound actions to modules.
//!
//! The receive loop awaits every emission to completion before reading the
//! next event, so handlers of different inbound events never interleave.
//! A failing emission is logged and reported on [`CLIENT_ERROR`]; it never
//! ends the loop.

mod gateway;
pub mod loopback;

use std::path::Path;
use std::sync::Arc;

use discorrecd_core::{DispatchError, Dispatcher};
use parking_lot::RwLock;
use tracing::{debug, error, info, trace};

use crate::payload::{Message, Payload, TextChannel, User};

pub use gateway::{
    BoxedGateway, CLIENT_ERROR, ClientError, ClientResult, Connection, Connector, EventSource,
    Gateway, HOOKED_EVENTS, MESSAGE, MESSAGE_DELETE, MESSAGE_EDIT, PlatformEvent, READY, RESUMED,
    TYPING,
};

/// The client wrapping a platform connection.
pub struct CoreClient {
    events: Arc<Dispatcher<Payload>>,
    gateway: RwLock<Option<BoxedGateway>>,
}

impl CoreClient {
    /// Creates a disconnected client and registers [`HOOKED_EVENTS`] on
    /// `events`.
    pub fn new(events: Arc<Dispatcher<Payload>>) -> Self {
        for name in HOOKED_EVENTS {
            events.add(*name);
        }
        Self {
            events,
            gateway: RwLock::new(None),
        }
    }

    /// Returns the events dispatcher.
    pub fn events(&self) -> &Arc<Dispatcher<Payload>> {
        &self.events
    }

    /// Attaches a live gateway; outbound actions go through it from now on.
    pub fn attach(&self, gateway: BoxedGateway) {
        info!(user = %gateway.current_user(), "Client connected");
        *self.gateway.write() = Some(gateway);
    }

    /// Detaches the gateway, returning it if one was attached.
    pub fn detach(&self) -> Option<BoxedGateway> {
        self.gateway.write().take()
    }

    /// Returns `true` while a gateway is attached.
    pub fn is_connected(&self) -> bool {
        self.gateway.read().is_some()
    }

    /// Returns the attached gateway.
    pub fn gateway(&self) -> ClientResult<BoxedGateway> {
        self.gateway.read().clone().ok_or(ClientError::NotConnected)
    }

    /// Returns the account the client is logged in as.
    pub fn user(&self) -> ClientResult<User> {
        Ok(self.gateway()?.current_user())
    }

    pub async fn send_message(&self, channel: &TextChannel, content: &str) -> ClientResult<Message> {
        self.gateway()?.send_message(channel, content).await
    }

    pub async fn delete_message(&self, message: &Message) -> ClientResult<()> {
        self.gateway()?.delete_message(message).await
    }

    pub async fn send_file(
        &self,
        channel: &TextChannel,
        path: &Path,
        content: Option<&str>,
    ) -> ClientResult<Message> {
        self.gateway()?.send_file(channel, path, content).await
    }

    /// Emits one inbound platform event and waits for its handler chain.
    pub async fn handle(&self, event: PlatformEvent) {
        let name = event.channel_name();
        self.dispatch(name, event.into_payload()).await;
    }

    /// Emits `payload` on the events channel `name`.
    ///
    /// Failures are logged and re-emitted on [`CLIENT_ERROR`]. A failure of a
    /// `client_error` handler is only logged.
    pub async fn dispatch(&self, name: &str, payload: Payload) {
        trace!(event = name, "Dispatching platform event");
        if let Err(e) = self.events.emit(name, payload).await {
            self.report(name, e).await;
        }
    }

    async fn report(&self, event: &str, error: DispatchError) {
        error!(event, error = %error, "Event emission failed");
        if event == CLIENT_ERROR {
            return;
        }

        let payload = Payload::ClientError {
            event: event.to_string(),
            reason: error.to_string(),
        };
        if let Err(e) = self.events.emit(CLIENT_ERROR, payload).await {
            error!(error = %e, "Error handler failed");
        }
    }

    /// Drains `source` until it is exhausted.
    ///
    /// Returns the source's error if the connection fails.
    pub async fn run(&self, mut source: Box<dyn EventSource>) -> ClientResult<()> {
        debug!("Client loop started");
        while let Some(next) = source.next_event().await {
            match next {
                Ok(event) => self.handle(event).await,
                Err(e) => {
                    error!(error = %e, "Connection failed");
                    return Err(e);
                }
            }
        }
        info!("Connection ended");
        Ok(())
    }
}

impl std::fmt::Debug for CoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreClient")
            .field("events", &self.events)
            .field("connected", &self.is_connected())
            .finish()
    }
}
