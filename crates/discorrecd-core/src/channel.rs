//! Named, ordered handler registries.
//!
//! A [`Channel`] represents one event (for example `"message"` or `"ready"`).
//! It keeps its handlers in insertion order and runs them one after another
//! on every [`emit`](Channel::emit):
//!
//! 1. A disabled or empty channel returns immediately
//! 2. Handlers run in registration order, each awaited before the next
//! 3. Handlers that are not effectively enabled are skipped without spending budget
//! 4. The first handler error aborts the rest of the chain and is returned
//!
//! ```rust,ignore
//! use discorrecd_core::{CallLimit, Channel};
//!
//! let channel = Channel::new("message");
//! let logger = channel.add(log_message);
//! channel.add_with_limit(greet_once, CallLimit::Remaining(1));
//!
//! channel.emit(message).await?; // log_message, then greet_once
//! channel.emit(message).await?; // log_message only
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::{DispatchError, DispatchResult};
use crate::handler::{CallLimit, CallOutcome, Handler, HandlerId, IntoHandler};

/// A named event with an ordered, de-duplicated set of handlers.
pub struct Channel<A> {
    name: String,
    enabled: AtomicBool,
    handlers: RwLock<Vec<Handler<A>>>,
}

impl<A> Channel<A> {
    /// Creates an enabled channel with no handlers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: AtomicBool::new(true),
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Returns the channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether emissions on this channel run any handler.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Enables or disables the whole channel.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Returns the number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    /// Returns `true` if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Returns `true` if a handler with this id is registered.
    pub fn contains(&self, id: HandlerId) -> bool {
        self.handlers.read().iter().any(|h| h.id() == id)
    }

    /// Looks up a registered handler by id.
    pub fn get(&self, id: HandlerId) -> Option<Handler<A>> {
        self.handlers.read().iter().find(|h| h.id() == id).cloned()
    }

    /// Returns the registered handlers in emission order.
    pub fn handlers(&self) -> Vec<Handler<A>> {
        self.handlers.read().clone()
    }

    /// Removes a handler. Removing an absent id is a no-op.
    pub fn remove(&self, id: HandlerId) -> Option<Handler<A>> {
        let mut handlers = self.handlers.write();
        let index = handlers.iter().position(|h| h.id() == id)?;
        Some(handlers.remove(index))
    }

    /// Removes every handler. The channel itself stays registered.
    pub fn clear(&self) {
        self.handlers.write().clear();
    }
}

impl<A: Clone + Send + 'static> Channel<A> {
    /// Adds a handler with an unlimited budget.
    ///
    /// See [`add_with_limit`](Self::add_with_limit).
    pub fn add(&self, handler: impl IntoHandler<A>) -> Handler<A> {
        self.add_with_limit(handler, CallLimit::Unlimited)
    }

    /// Adds a handler with the given budget and returns the registered entry.
    ///
    /// A handler whose id is already registered keeps its position and its
    /// enabled flag; only its budget is replaced. New handlers are appended.
    pub fn add_with_limit(&self, handler: impl IntoHandler<A>, limit: CallLimit) -> Handler<A> {
        let handler = handler.into_handler();
        let mut handlers = self.handlers.write();

        if let Some(existing) = handlers.iter().find(|h| h.id() == handler.id()) {
            existing.set_limit(limit);
            return existing.clone();
        }

        handler.set_limit(limit);
        handlers.push(handler.clone());
        trace!(channel = %self.name, handler = %handler.id(), %limit, "Handler added");
        handler
    }

    /// Emits the channel, calling every effectively enabled handler in order.
    ///
    /// The handler list is snapshotted when the emission starts; handlers
    /// added or removed while it runs take effect on the next emission.
    pub async fn emit(&self, args: A) -> DispatchResult<()> {
        if !self.is_enabled() {
            trace!(channel = %self.name, "Channel disabled, skipping emit");
            return Ok(());
        }

        let handlers = self.handlers();
        if handlers.is_empty() {
            return Ok(());
        }

        debug!(channel = %self.name, handler_count = handlers.len(), "Emitting event");

        for handler in &handlers {
            let outcome = handler
                .call(args.clone())
                .await
                .map_err(|source| DispatchError::Handler {
                    channel: self.name.clone(),
                    handler: handler.id(),
                    source,
                })?;

            if outcome == CallOutcome::Skipped {
                trace!(channel = %self.name, handler = %handler.id(), "Handler disabled, skipped");
            }
        }

        Ok(())
    }
}

impl<A> fmt::Display for Channel<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl<A> fmt::Debug for Channel<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("enabled", &self.is_enabled())
            .field("handler_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn recorder(log: &Log, tag: &'static str) -> Handler<()> {
        let log = Arc::clone(log);
        Handler::new(move |()| {
            let log = Arc::clone(&log);
            async move {
                log.lock().push(tag);
            }
        })
    }

    #[tokio::test]
    async fn test_emit_runs_in_insertion_order() {
        let log = Log::default();
        let channel = Channel::new("msg");
        channel.add(recorder(&log, "h1"));
        channel.add(recorder(&log, "h2"));
        channel.add(recorder(&log, "h3"));

        channel.emit(()).await.unwrap();

        assert_eq!(*log.lock(), vec!["h1", "h2", "h3"]);
    }

    #[tokio::test]
    async fn test_readding_updates_limit_in_place() {
        let log = Log::default();
        let channel = Channel::new("msg");
        let first = recorder(&log, "first");
        channel.add_with_limit(first.clone(), CallLimit::Remaining(3));
        channel.add(recorder(&log, "second"));

        let entry = channel.add_with_limit(first.clone(), CallLimit::Remaining(1));

        assert_eq!(channel.len(), 2);
        assert!(entry.same_as(&first));
        assert_eq!(entry.limit(), CallLimit::Remaining(1));
        assert_eq!(channel.handlers()[0].id(), first.id());
    }

    #[tokio::test]
    async fn test_readding_keeps_enabled_flag() {
        let log = Log::default();
        let channel = Channel::new("msg");
        let handler = channel.add(recorder(&log, "h"));
        handler.set_enabled(false);

        channel.add_with_limit(handler.clone(), CallLimit::Remaining(2));

        assert!(!handler.is_manually_enabled());
        channel.emit(()).await.unwrap();
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_limited_handler_is_skipped_after_budget() {
        let log = Log::default();
        let channel = Channel::new("ping");
        channel.add_with_limit(recorder(&log, "once"), CallLimit::Remaining(1));
        channel.add(recorder(&log, "always"));

        channel.emit(()).await.unwrap();
        channel.emit(()).await.unwrap();

        assert_eq!(*log.lock(), vec!["once", "always", "always"]);
        assert_eq!(channel.len(), 2);
    }

    #[tokio::test]
    async fn test_disabled_handler_not_charged() {
        let log = Log::default();
        let channel = Channel::new("msg");
        let handler = channel.add(recorder(&log, "h"));
        handler.set_enabled(false);

        channel.emit(()).await.unwrap();

        assert!(log.lock().is_empty());
        assert_eq!(handler.limit(), CallLimit::Unlimited);
    }

    #[tokio::test]
    async fn test_disabled_channel_runs_nothing() {
        let log = Log::default();
        let channel = Channel::new("msg");
        channel.add(recorder(&log, "h"));
        channel.set_enabled(false);

        channel.emit(()).await.unwrap();
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_clear_then_emit_is_noop() {
        let log = Log::default();
        let channel = Channel::new("msg");
        channel.add(recorder(&log, "h"));
        channel.clear();

        assert!(channel.is_empty());
        channel.emit(()).await.unwrap();
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_remove_absent_is_noop() {
        let log = Log::default();
        let channel = Channel::new("msg");
        let handler = channel.add(recorder(&log, "h"));

        assert!(channel.remove(handler.id()).is_some());
        assert!(channel.remove(handler.id()).is_none());
        assert!(!channel.contains(handler.id()));
    }

    #[tokio::test]
    async fn test_handler_error_aborts_chain() {
        let log = Log::default();
        let channel = Channel::new("msg");
        channel.add(recorder(&log, "before"));
        let failing = channel.add(|()| async { Err::<(), _>("handler failed") });
        channel.add(recorder(&log, "after"));

        let err = channel.emit(()).await.unwrap_err();
        assert!(err.is_handler_failure());

        match err {
            DispatchError::Handler {
                channel, handler, ..
            } => {
                assert_eq!(channel, "msg");
                assert_eq!(handler, failing.id());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*log.lock(), vec!["before"]);
    }

    #[tokio::test]
    async fn test_handlers_receive_arguments() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let channel = Channel::new("msg");
        let sink = Arc::clone(&seen);
        channel.add(move |text: String| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().push(text);
            }
        });

        channel.emit("hello".to_string()).await.unwrap();
        channel.emit("world".to_string()).await.unwrap();

        assert_eq!(*seen.lock(), vec!["hello", "world"]);
    }
}
