//! Event dispatcher.
//!
//! The [`Dispatcher`] is a registry of [`Channel`]s keyed by name and the
//! single entry point through which callers add channels, attach handlers
//! and trigger emissions.
//!
//! Channels must be added explicitly before handlers can be attached to them
//! or before they can be emitted; neither operation creates a channel on the
//! fly.
//!
//! ```rust,ignore
//! use discorrecd_core::{CallLimit, Dispatcher};
//!
//! let events = Dispatcher::new();
//! events.add("ready");
//! events.add_handler("ready", on_ready, CallLimit::Remaining(1))?;
//!
//! events.emit("ready", payload).await?;
//! ```
//!
//! # Sharing
//!
//! A dispatcher is usually created once per concern at startup and shared
//! behind an `Arc` between the network client and the module loader. All
//! methods take `&self`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::channel::Channel;
use crate::error::{DispatchError, DispatchResult};
use crate::handler::{CallLimit, Handler, IntoHandler};

/// A registry of named [`Channel`]s.
pub struct Dispatcher<A> {
    channels: RwLock<BTreeMap<String, Arc<Channel<A>>>>,
}

impl<A> Default for Dispatcher<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Dispatcher<A> {
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(BTreeMap::new()),
        }
    }

    /// Adds a channel by name, returning the registered channel.
    ///
    /// Adding a name that already exists returns the existing channel.
    pub fn add(&self, name: impl Into<String>) -> Arc<Channel<A>> {
        let name = name.into();
        let mut channels = self.channels.write();
        if let Some(existing) = channels.get(&name) {
            return Arc::clone(existing);
        }

        debug!(channel = %name, "Channel added");
        let channel = Arc::new(Channel::new(name.clone()));
        channels.insert(name, Arc::clone(&channel));
        channel
    }

    /// Adds an existing channel object.
    ///
    /// Fails with [`DispatchError::DuplicateChannel`] if a channel with the same
    /// name is already registered, since two distinct channels cannot share a
    /// slot.
    pub fn add_channel(&self, channel: Channel<A>) -> DispatchResult<Arc<Channel<A>>> {
        let mut channels = self.channels.write();
        if channels.contains_key(channel.name()) {
            return Err(DispatchError::DuplicateChannel {
                name: channel.name().to_string(),
            });
        }

        debug!(channel = %channel.name(), "Channel added");
        let channel = Arc::new(channel);
        channels.insert(channel.name().to_string(), Arc::clone(&channel));
        Ok(channel)
    }

    /// Looks up a channel. Never creates one.
    pub fn get(&self, name: &str) -> Option<Arc<Channel<A>>> {
        self.channels.read().get(name).cloned()
    }

    /// Returns `true` if a channel with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.channels.read().contains_key(name)
    }

    /// Removes a channel together with its handlers.
    pub fn remove(&self, name: &str) -> Option<Arc<Channel<A>>> {
        self.channels.write().remove(name)
    }

    /// Returns the number of registered channels.
    pub fn len(&self) -> usize {
        self.channels.read().len()
    }

    /// Returns `true` if no channel is registered.
    pub fn is_empty(&self) -> bool {
        self.channels.read().is_empty()
    }

    /// Returns the registered channel names in lexical order.
    pub fn names(&self) -> Vec<String> {
        self.channels.read().keys().cloned().collect()
    }

    /// Returns the registered channels in name order.
    pub fn channels(&self) -> Vec<Arc<Channel<A>>> {
        self.channels.read().values().cloned().collect()
    }

    fn require(&self, name: &str) -> DispatchResult<Arc<Channel<A>>> {
        self.get(name)
            .ok_or_else(|| DispatchError::channel_not_found(name))
    }
}

impl<A: Clone + Send + 'static> Dispatcher<A> {
    /// Attaches a handler to a registered channel.
    ///
    /// Fails with [`DispatchError::ChannelNotFound`] if `name` was never added;
    /// the dispatcher is left unchanged in that case.
    pub fn add_handler(
        &self,
        name: &str,
        handler: impl IntoHandler<A>,
        limit: CallLimit,
    ) -> DispatchResult<Handler<A>> {
        Ok(self.require(name)?.add_with_limit(handler, limit))
    }

    /// Emits a registered channel with the given arguments.
    ///
    /// Fails with [`DispatchError::ChannelNotFound`] if `name` was never added,
    /// and with [`DispatchError::Handler`] if a handler in the chain fails.
    pub async fn emit(&self, name: &str, args: A) -> DispatchResult<()> {
        // The registry lock is released before any handler runs.
        let channel = self.require(name)?;
        channel.emit(args).await
    }
}

impl<A> fmt::Debug for Dispatcher<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("channels", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: &Arc<AtomicUsize>) -> Handler<()> {
        let counter = Arc::clone(counter);
        Handler::new(move |()| {
            let c = Arc::clone(&counter);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        })
    }

    #[test]
    fn test_add_then_contains() {
        let dispatcher: Dispatcher<()> = Dispatcher::new();
        dispatcher.add("x");
        assert!(dispatcher.contains("x"));
        assert!(!dispatcher.contains("y"));
        assert_eq!(dispatcher.len(), 1);
    }

    #[test]
    fn test_add_by_name_is_idempotent() {
        let dispatcher: Dispatcher<()> = Dispatcher::new();
        let first = dispatcher.add("message");
        let second = dispatcher.add("message");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(dispatcher.len(), 1);
    }

    #[test]
    fn test_add_channel_object_conflicts() {
        let dispatcher: Dispatcher<()> = Dispatcher::new();
        dispatcher.add_channel(Channel::new("ready")).unwrap();

        let err = dispatcher.add_channel(Channel::new("ready")).unwrap_err();
        assert!(matches!(err, DispatchError::DuplicateChannel { ref name } if name == "ready"));

        let err = {
            dispatcher.add("typing");
            dispatcher.add_channel(Channel::new("typing")).unwrap_err()
        };
        assert!(matches!(err, DispatchError::DuplicateChannel { .. }));
    }

    #[test]
    fn test_get_never_creates() {
        let dispatcher: Dispatcher<()> = Dispatcher::new();
        assert!(dispatcher.get("missing").is_none());
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn test_add_handler_to_missing_channel() {
        let counter = Arc::new(AtomicUsize::new(0));
        let dispatcher: Dispatcher<()> = Dispatcher::new();
        dispatcher.add("present");

        let err = dispatcher
            .add_handler("missing", counting(&counter), CallLimit::Unlimited)
            .unwrap_err();

        assert!(matches!(err, DispatchError::ChannelNotFound { ref name } if name == "missing"));
        assert_eq!(dispatcher.names(), vec!["present".to_string()]);
        assert!(dispatcher.get("present").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_use_handler() {
        let counter = Arc::new(AtomicUsize::new(0));
        let dispatcher: Dispatcher<()> = Dispatcher::new();
        dispatcher.add("ping");
        dispatcher
            .add_handler("ping", counting(&counter), CallLimit::Remaining(1))
            .unwrap();

        dispatcher.emit("ping", ()).await.unwrap();
        dispatcher.emit("ping", ()).await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_emit_missing_channel_fails() {
        let dispatcher: Dispatcher<()> = Dispatcher::new();
        let err = dispatcher.emit("nowhere", ()).await.unwrap_err();
        assert!(matches!(err, DispatchError::ChannelNotFound { .. }));
        assert!(!err.is_handler_failure());
    }

    #[tokio::test]
    async fn test_channels_are_independent() {
        let counter = Arc::new(AtomicUsize::new(0));
        let dispatcher: Dispatcher<()> = Dispatcher::new();
        dispatcher.add("a");
        dispatcher.add("b");
        let shared = counting(&counter);
        dispatcher
            .add_handler("a", shared.clone(), CallLimit::Unlimited)
            .unwrap();
        dispatcher
            .add_handler("b", shared, CallLimit::Unlimited)
            .unwrap();

        dispatcher.get("b").unwrap().set_enabled(false);
        dispatcher.emit("a", ()).await.unwrap();
        dispatcher.emit("b", ()).await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handler_may_mutate_registry_during_emit() {
        let counter = Arc::new(AtomicUsize::new(0));
        let dispatcher = Arc::new(Dispatcher::<()>::new());
        dispatcher.add("tick");

        let inner = Arc::clone(&dispatcher);
        let late = counting(&counter);
        dispatcher
            .add_handler(
                "tick",
                move |()| {
                    let inner = Arc::clone(&inner);
                    let late = late.clone();
                    async move {
                        inner
                            .add_handler("tick", late, CallLimit::Unlimited)
                            .map(|_| ())
                    }
                },
                CallLimit::Unlimited,
            )
            .unwrap();

        // The handler added mid-emission only runs from the next emission on.
        dispatcher.emit("tick", ()).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        dispatcher.emit("tick", ()).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
