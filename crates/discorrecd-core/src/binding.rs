//! Declarative handler bindings.
//!
//! A [`Binding`] is an immutable descriptor declared next to a module's
//! methods: which channels the method listens on, its invocation budget, how
//! it binds to the owning instance, and which dispatcher family
//! ([`Category`]) it belongs to. At module activation the descriptor is
//! resolved into a concrete [`Handler`] and registered on every named channel.
//!
//! Types expose their descriptors by implementing [`Declared`]. Two
//! dispatchers can scan the same instance with different category filters, so
//! one type can declare both ordinary event observers and command handlers:
//!
//! ```rust,ignore
//! use discorrecd_core::{Binding, Category, Declared, register_declared};
//!
//! struct Greeter;
//!
//! impl Greeter {
//!     async fn on_message(self: Arc<Self>, text: String) { /* ... */ }
//!     async fn on_hello(self: Arc<Self>, text: String) { /* ... */ }
//! }
//!
//! impl Declared<String> for Greeter {
//!     fn bindings() -> Vec<Binding<Self, String>> {
//!         vec![
//!             Binding::event(["message"]).method(Self::on_message),
//!             Binding::command(["hello"]).limit(3).method(Self::on_hello),
//!         ]
//!     }
//! }
//!
//! let greeter = Arc::new(Greeter);
//! register_declared(&events, &Category::EVENTS, &greeter)?;
//! register_declared(&commands, &Category::COMMANDS, &greeter)?;
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::debug;

use crate::dispatcher::Dispatcher;
use crate::error::{BoxError, DispatchError, DispatchResult};
use crate::handler::{CallLimit, Handler, HandlerOutput};

// ============================================================================
// Category
// ============================================================================

/// Tag partitioning bindings between independent dispatcher families.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category(Cow<'static, str>);

impl Category {
    /// Ordinary platform event observers.
    pub const EVENTS: Self = Self(Cow::Borrowed("events"));

    /// User command handlers.
    pub const COMMANDS: Self = Self(Cow::Borrowed("commands"));

    /// Creates a custom category.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Returns the category name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Binding
// ============================================================================

/// How a binding's method relates to the instance it is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    /// The method receives the owning instance; every instance gets its own
    /// handler.
    Instance,
    /// A free function; every instance resolves to the same shared handler.
    Shared,
}

type InstanceFn<M, A> = Arc<dyn Fn(Arc<M>, A) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

enum Method<M, A> {
    Unset,
    Instance(InstanceFn<M, A>),
    Shared(Handler<A>),
}

impl<M, A> Clone for Method<M, A> {
    fn clone(&self) -> Self {
        match self {
            Self::Unset => Self::Unset,
            Self::Instance(f) => Self::Instance(Arc::clone(f)),
            Self::Shared(h) => Self::Shared(h.clone()),
        }
    }
}

/// An immutable description of one declared handler method.
pub struct Binding<M, A> {
    category: Category,
    events: Vec<String>,
    limit: CallLimit,
    method: Method<M, A>,
}

impl<M, A> Clone for Binding<M, A> {
    fn clone(&self) -> Self {
        Self {
            category: self.category.clone(),
            events: self.events.clone(),
            limit: self.limit,
            method: self.method.clone(),
        }
    }
}

impl<M, A> Binding<M, A> {
    /// Declares a binding in the given category.
    pub fn new<I>(category: Category, events: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            category,
            events: events.into_iter().map(Into::into).collect(),
            limit: CallLimit::Unlimited,
            method: Method::Unset,
        }
    }

    /// Declares an event observer binding.
    pub fn event<I>(events: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::new(Category::EVENTS, events)
    }

    /// Declares a command handler binding.
    pub fn command<I>(names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::new(Category::COMMANDS, names)
    }

    /// Caps the number of invocations of the resolved handler.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = CallLimit::Remaining(limit);
        self
    }

    /// Returns the channel names this binding targets.
    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// Returns the dispatcher family of this binding.
    pub fn category(&self) -> &Category {
        &self.category
    }

    /// Returns the budget given to the resolved handler.
    pub fn call_limit(&self) -> CallLimit {
        self.limit
    }

    /// Returns the bind mode, or `None` if no method was attached.
    pub fn mode(&self) -> Option<BindMode> {
        match self.method {
            Method::Unset => None,
            Method::Instance(_) => Some(BindMode::Instance),
            Method::Shared(_) => Some(BindMode::Shared),
        }
    }

    /// Checks that registering on `dispatcher` would succeed, without
    /// touching it.
    ///
    /// Fails with [`DispatchError::ChannelNotFound`] for the first named
    /// channel `dispatcher` lacks, then with
    /// [`DispatchError::InvalidHandler`] if no method was attached.
    pub fn check(&self, dispatcher: &Dispatcher<A>) -> DispatchResult<()> {
        if let Some(missing) = self.events.iter().find(|name| !dispatcher.contains(name)) {
            return Err(DispatchError::channel_not_found(missing.as_str()));
        }
        self.check_method()
    }

    /// Fails with [`DispatchError::InvalidHandler`] if no method was attached.
    pub fn check_method(&self) -> DispatchResult<()> {
        match self.method {
            Method::Unset => Err(self.no_method()),
            _ => Ok(()),
        }
    }

    fn no_method(&self) -> DispatchError {
        DispatchError::invalid_handler(format!(
            "binding for {:?} has no method attached",
            self.events
        ))
    }
}

impl<M, A> Binding<M, A>
where
    M: Send + Sync + 'static,
    A: Send + 'static,
{
    /// Attaches a method that is bound to the owning instance.
    pub fn method<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arc<M>, A) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: HandlerOutput,
    {
        self.method = Method::Instance(Arc::new(move |instance, args| {
            f(instance, args).map(HandlerOutput::into_result).boxed()
        }));
        self
    }

    /// Attaches a free function shared by every instance.
    ///
    /// The handler is created here, once; clones of this binding resolve to
    /// the same handler.
    pub fn function<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: HandlerOutput,
    {
        self.method = Method::Shared(Handler::new(f));
        self
    }

    /// Resolves the binding against an instance.
    ///
    /// Fails with [`DispatchError::InvalidHandler`] if no method was attached.
    pub fn bind(&self, instance: &Arc<M>) -> DispatchResult<Handler<A>> {
        match &self.method {
            Method::Unset => Err(self.no_method()),
            Method::Instance(f) => {
                let f = Arc::clone(f);
                let instance = Arc::clone(instance);
                Ok(Handler::with_limit(
                    move |args| f(Arc::clone(&instance), args),
                    self.limit,
                ))
            }
            Method::Shared(handler) => Ok(handler.clone()),
        }
    }
}

impl<M, A> Binding<M, A>
where
    M: Send + Sync + 'static,
    A: Clone + Send + 'static,
{
    /// Resolves the binding and registers the resulting handler on every
    /// named channel of `dispatcher`.
    ///
    /// All channels are checked before anything is registered, so a missing
    /// channel leaves the dispatcher unchanged.
    pub fn register(&self, dispatcher: &Dispatcher<A>, instance: &Arc<M>) -> DispatchResult<Handler<A>> {
        self.check(dispatcher)?;

        let handler = self.bind(instance)?;
        for name in &self.events {
            dispatcher.add_handler(name, handler.clone(), self.limit)?;
        }

        debug!(
            category = %self.category,
            events = ?self.events,
            handler = %handler.id(),
            "Binding registered"
        );
        Ok(handler)
    }
}

impl<M, A> fmt::Debug for Binding<M, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("category", &self.category)
            .field("events", &self.events)
            .field("limit", &self.limit)
            .field("mode", &self.mode())
            .finish()
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Types that declare their handler bindings.
pub trait Declared<A>: Send + Sync + Sized + 'static {
    /// Returns every binding this type declares.
    fn bindings() -> Vec<Binding<Self, A>>;
}

/// Registers the bindings of `category` from an explicit list.
///
/// Bindings of other categories are ignored. Returns the registered handlers
/// in declaration order.
pub fn register_bindings<M, A>(
    dispatcher: &Dispatcher<A>,
    category: &Category,
    instance: &Arc<M>,
    bindings: &[Binding<M, A>],
) -> DispatchResult<Vec<Handler<A>>>
where
    M: Send + Sync + 'static,
    A: Clone + Send + 'static,
{
    bindings
        .iter()
        .filter(|binding| binding.category() == category)
        .map(|binding| binding.register(dispatcher, instance))
        .collect()
}

/// Registers every binding of `category` declared by `M`.
pub fn register_declared<M, A>(
    dispatcher: &Dispatcher<A>,
    category: &Category,
    instance: &Arc<M>,
) -> DispatchResult<Vec<Handler<A>>>
where
    M: Declared<A>,
    A: Clone + Send + 'static,
{
    register_bindings(dispatcher, category, instance, &M::bindings())
}
