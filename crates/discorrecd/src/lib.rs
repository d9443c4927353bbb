//! # Discorrecd
//!
//! A small modular chat bot framework. Platform events flow from a connection
//! into named channels of an ordered dispatcher, where module handlers run one
//! after another in registration order.
//!
//! ```text
//! ┌────────────┐  PlatformEvent  ┌────────────┐  emit("message")  ┌──────────────────────┐
//! │ Connection │────────────────▶│ CoreClient │──────────────────▶│ events Dispatcher    │
//! └────────────┘                 └────────────┘                   │  message: router ─┐  │
//!                                                                 │           module  │  │
//!                                                                 └───────────────────┼──┘
//!                                                    emit("<name>")                   ▼
//!                                                                 ┌──────────────────────┐
//!                                                                 │ commands Dispatcher  │
//!                                                                 └──────────────────────┘
//! ```
//!
//! - **Core** (`discorrecd-core`): handlers, channels, dispatchers and
//!   declarative bindings
//! - **Runtime** (`discorrecd-runtime`): configuration, logging, client glue
//!   and the module loader
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use discorrecd::prelude::*;
//!
//! struct Pong {
//!     client: Arc<CoreClient>,
//! }
//!
//! impl Pong {
//!     async fn on_ping(self: Arc<Self>, payload: Payload) -> Result<(), ClientError> {
//!         if let Some(cmd) = payload.as_command() {
//!             self.client.send_message(&cmd.message.channel, "pong").await?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! impl Declared<Payload> for Pong {
//!     fn bindings() -> Vec<Binding<Self, Payload>> {
//!         vec![Binding::command(["ping"]).method(Self::on_ping)]
//!     }
//! }
//!
//! impl Module for Pong {
//!     const NAME: &'static str = "pong";
//!
//!     fn new(ctx: &ModuleContext) -> Result<Self, BoxError> {
//!         Ok(Self { client: ctx.client().clone() })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut bot = Discorrecd::initialize(ConfigLoader::new())?;
//!     bot.add::<Pong>()?;
//!     bot.start(&connector).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `json-config`: JSON configuration files (default)
//! - `json-log`: JSON log lines

pub use discorrecd_core as core;
pub use discorrecd_runtime as runtime;

pub use discorrecd_runtime::{config, logging};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use discorrecd::prelude::*;
/// ```
pub mod prelude {
    pub use discorrecd_runtime::prelude::*;

    pub use discorrecd_core::{Channel, Dispatcher, register_bindings, register_declared};
}
