//! Handler wrapper for the dispatch core.
//!
//! A [`Handler`] wraps a single async callable and tracks two pieces of state:
//! a manual enabled flag and an invocation budget ([`CallLimit`]). The handler
//! is *effectively* enabled only while the flag is set and the budget is not
//! exhausted.
//!
//! Handlers are cheap handles: cloning one yields another handle to the same
//! callable, the same [`HandlerId`] and the same state. The id is what
//! channels use to de-duplicate registrations.
//!
//! ```rust,ignore
//! use discorrecd_core::{CallLimit, Handler};
//!
//! let handler = Handler::with_limit(
//!     |name: String| async move { println!("hello {name}") },
//!     CallLimit::Remaining(1),
//! );
//!
//! handler.call("world".to_string()).await?; // invoked, budget now 0
//! handler.call("again".to_string()).await?; // skipped
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;

use crate::error::BoxError;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// HandlerId
// ============================================================================

/// Stable identity of a [`Handler`], assigned when the handler is created.
///
/// Ids are unique for the lifetime of the process and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    fn next() -> Self {
        Self(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value of this id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// CallLimit
// ============================================================================

/// Remaining number of invocations a handler may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallLimit {
    /// No cap on invocations.
    #[default]
    Unlimited,
    /// At most this many further invocations.
    Remaining(u32),
}

impl CallLimit {
    /// Returns `true` once a finite budget has reached zero.
    pub fn is_exhausted(self) -> bool {
        matches!(self, Self::Remaining(0))
    }

    /// Returns `true` if this limit never runs out.
    pub fn is_unlimited(self) -> bool {
        matches!(self, Self::Unlimited)
    }

    fn consume(&mut self) {
        if let Self::Remaining(n) = self {
            *n = n.saturating_sub(1);
        }
    }
}

impl From<u32> for CallLimit {
    fn from(n: u32) -> Self {
        Self::Remaining(n)
    }
}

impl From<Option<u32>> for CallLimit {
    fn from(n: Option<u32>) -> Self {
        n.map_or(Self::Unlimited, Self::Remaining)
    }
}

impl fmt::Display for CallLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => f.write_str("unlimited"),
            Self::Remaining(n) => write!(f, "{n}"),
        }
    }
}

// ============================================================================
// HandlerOutput
// ============================================================================

/// Types that can be returned from a handler callable.
///
/// Handlers may be infallible (`()`) or fallible (`Result<(), E>`); a returned
/// error aborts the emission it was called from.
pub trait HandlerOutput: Send + 'static {
    /// Converts the output into the uniform handler result.
    fn into_result(self) -> Result<(), BoxError>;
}

impl HandlerOutput for () {
    fn into_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E> HandlerOutput for Result<(), E>
where
    E: Into<BoxError> + Send + 'static,
{
    fn into_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

// ============================================================================
// Handler
// ============================================================================

/// Whether a call actually reached the underlying callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// The callable ran to completion.
    Invoked,
    /// The handler was not effectively enabled; nothing happened.
    Skipped,
}

type Callable<A> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

#[derive(Debug)]
struct HandlerState {
    enabled: bool,
    limit: CallLimit,
}

impl HandlerState {
    fn is_enabled(&self) -> bool {
        self.enabled && !self.limit.is_exhausted()
    }
}

struct HandlerInner<A> {
    id: HandlerId,
    callable: Callable<A>,
    state: Mutex<HandlerState>,
}

/// A registered async callable with an enabled flag and an invocation budget.
pub struct Handler<A> {
    inner: Arc<HandlerInner<A>>,
}

impl<A> Clone for Handler<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: Send + 'static> Handler<A> {
    /// Wraps an async callable with an unlimited budget.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: HandlerOutput,
    {
        Self::with_limit(f, CallLimit::Unlimited)
    }

    /// Wraps an async callable with the given budget.
    pub fn with_limit<F, Fut>(f: F, limit: CallLimit) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: HandlerOutput,
    {
        let callable: Callable<A> =
            Arc::new(move |args| f(args).map(HandlerOutput::into_result).boxed());

        Self {
            inner: Arc::new(HandlerInner {
                id: HandlerId::next(),
                callable,
                state: Mutex::new(HandlerState {
                    enabled: true,
                    limit,
                }),
            }),
        }
    }

    /// Calls the handler.
    ///
    /// A handler that is not effectively enabled is skipped without side
    /// effects. Otherwise a finite budget is decremented *before* the callable
    /// runs, so a failing invocation still consumes one call. Errors from the
    /// callable are returned unchanged.
    pub async fn call(&self, args: A) -> Result<CallOutcome, BoxError> {
        if !self.acquire() {
            return Ok(CallOutcome::Skipped);
        }
        (self.inner.callable)(args).await?;
        Ok(CallOutcome::Invoked)
    }

    // Check and decrement must happen under one lock.
    fn acquire(&self) -> bool {
        let mut state = self.inner.state.lock();
        if !state.is_enabled() {
            return false;
        }
        state.limit.consume();
        true
    }
}

impl<A> Handler<A> {
    /// Returns the stable identity of this handler.
    pub fn id(&self) -> HandlerId {
        self.inner.id
    }

    /// Returns the remaining budget.
    pub fn limit(&self) -> CallLimit {
        self.inner.state.lock().limit
    }

    /// Replaces the remaining budget, re-arming an exhausted handler.
    pub fn set_limit(&self, limit: impl Into<CallLimit>) {
        self.inner.state.lock().limit = limit.into();
    }

    /// Effective enabled state: the manual flag and a non-exhausted budget.
    pub fn is_enabled(&self) -> bool {
        self.inner.state.lock().is_enabled()
    }

    /// The manual flag alone, ignoring the budget.
    pub fn is_manually_enabled(&self) -> bool {
        self.inner.state.lock().enabled
    }

    /// Sets the manual flag. This never restores an exhausted budget.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.state.lock().enabled = enabled;
    }

    /// Returns `true` if both handles refer to the same handler.
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<A> fmt::Debug for Handler<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Handler")
            .field("id", &self.inner.id)
            .field("enabled", &state.enabled)
            .field("limit", &state.limit)
            .finish()
    }
}

// ============================================================================
// IntoHandler
// ============================================================================

/// Conversion into a [`Handler`].
///
/// Implemented for every async callable taking `A` (producing a new handler
/// with a fresh id) and for `Handler<A>` itself (keeping its identity).
pub trait IntoHandler<A> {
    /// Performs the conversion.
    fn into_handler(self) -> Handler<A>;
}

impl<A> IntoHandler<A> for Handler<A> {
    fn into_handler(self) -> Handler<A> {
        self
    }
}

impl<A, F, Fut> IntoHandler<A> for F
where
    A: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: HandlerOutput,
{
    fn into_handler(self) -> Handler<A> {
        Handler::new(self)
    }
}
