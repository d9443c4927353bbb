//! # Discorrecd Runtime
//!
//! Everything around the dispatch core: configuration, logging, the platform
//! data model, the network-client glue and the module loader.
//!
//! ```rust,ignore
//! use discorrecd_runtime::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut bot = Discorrecd::initialize(ConfigLoader::new())?;
//!     bot.add::<MyModule>()?;
//!
//!     let (connector, handle) = LoopbackConnector::new(User::new(1, "bot"));
//!     bot.start(&connector).await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod logging;
pub mod module;
pub mod payload;
pub mod runtime;

pub use app::Discorrecd;
pub use client::{ClientError, Connector, CoreClient, Gateway, PlatformEvent};
pub use config::{ConfigError, ConfigLoader, Credentials, DiscorrecdConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use module::{Module, ModuleContext};
pub use payload::{Command, Message, Payload, TextChannel, User};
pub use runtime::Core;

/// Common imports for writing modules and entry points.
pub mod prelude {
    pub use std::sync::Arc;

    pub use discorrecd_core::{
        Binding, BoxError, CallLimit, Category, Declared, DispatchError, Handler,
    };

    pub use crate::app::Discorrecd;
    pub use crate::client::loopback::{Action, LoopbackConnector, LoopbackHandle};
    pub use crate::client::{ClientError, Connector, CoreClient, Gateway, PlatformEvent};
    pub use crate::config::{ConfigLoader, DiscorrecdConfig};
    pub use crate::error::{RuntimeError, RuntimeResult};
    pub use crate::module::{Module, ModuleContext};
    pub use crate::payload::{Command, Message, Payload, TextChannel, User};
    pub use crate::runtime::Core;
}
