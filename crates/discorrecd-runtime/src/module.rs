//! Bot modules.
//!
//! A module is a type that declares its handlers through [`Declared`] and is
//! built from a [`ModuleContext`] when added to a [`Core`](crate::Core).
//!
//! ```rust,ignore
//! use discorrecd_runtime::prelude::*;
//!
//! struct Greeter {
//!     client: Arc<CoreClient>,
//! }
//!
//! impl Greeter {
//!     async fn on_hello(self: Arc<Self>, payload: Payload) -> Result<(), ClientError> {
//!         if let Some(cmd) = payload.as_command() {
//!             self.client.send_message(&cmd.message.channel, "hello!").await?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! impl Declared<Payload> for Greeter {
//!     fn bindings() -> Vec<Binding<Self, Payload>> {
//!         vec![Binding::command(["hello"]).method(Self::on_hello)]
//!     }
//! }
//!
//! impl Module for Greeter {
//!     const NAME: &'static str = "greeter";
//!
//!     fn new(ctx: &ModuleContext) -> Result<Self, BoxError> {
//!         Ok(Self { client: ctx.client().clone() })
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use discorrecd_core::{BoxError, Declared};
use serde::de::DeserializeOwned;

use crate::client::CoreClient;
use crate::config::ConfigResult;
use crate::config::schema::deserialize_section;
use crate::payload::Payload;

/// A bot module.
pub trait Module: Declared<Payload> {
    /// Unique module name; also the key of its config section.
    const NAME: &'static str;

    /// Builds the module.
    fn new(ctx: &ModuleContext) -> Result<Self, BoxError>;
}

/// What a module receives when it is built.
#[derive(Debug, Clone)]
pub struct ModuleContext {
    name: &'static str,
    client: Arc<CoreClient>,
    section: serde_json::Value,
    data_dir: PathBuf,
}

impl ModuleContext {
    pub fn new(
        name: &'static str,
        client: Arc<CoreClient>,
        section: serde_json::Value,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name,
            client,
            section,
            data_dir: data_dir.into(),
        }
    }

    /// Returns the name of the module being built.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the client; outbound actions fail until it is connected.
    pub fn client(&self) -> &Arc<CoreClient> {
        &self.client
    }

    /// Returns the raw config section of the module.
    pub fn raw_config(&self) -> &serde_json::Value {
        &self.section
    }

    /// Deserializes the config section; an absent section yields `T::default()`.
    pub fn config<T>(&self) -> ConfigResult<T>
    where
        T: DeserializeOwned + Default,
    {
        deserialize_section(self.name, self.section.clone())
    }

    /// Returns the shared data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
