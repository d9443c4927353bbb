//! # Discorrecd Core
//!
//! In-process event dispatch for the Discorrecd bot framework.
//!
//! ```text
//! network client ──emit("message", payload)──▶ Dispatcher
//!                                                 │ lookup by name
//!                                                 ▼
//!                                              Channel "message"
//!                                                 │ in registration order, one at a time
//!                                                 ▼
//!                                     Handler ─▶ Handler ─▶ Handler
//! ```
//!
//! - [`Handler`]: one async callable with an enabled flag and a [`CallLimit`]
//! - [`Channel`]: a named, ordered, de-duplicated set of handlers
//! - [`Dispatcher`]: a registry of channels, the entry point for attach/emit
//! - [`Binding`]: a declarative descriptor resolved into a handler when a
//!   module is activated, partitioned by [`Category`]
//!
//! Handlers of one emission never run concurrently with each other, and a
//! handler error aborts the rest of its chain. There is no timeout: a handler
//! that never completes blocks its chain and the emitting caller.

pub mod binding;
pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod handler;

pub use binding::{BindMode, Binding, Category, Declared, register_bindings, register_declared};
pub use channel::Channel;
pub use dispatcher::Dispatcher;
pub use error::{BoxError, DispatchError, DispatchResult};
pub use handler::{CallLimit, CallOutcome, Handler, HandlerId, HandlerOutput, IntoHandler};
