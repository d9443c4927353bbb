//! Application entry point.

use std::sync::Arc;

use tracing::info;

use crate::client::Connector;
use crate::config::{ConfigLoader, DiscorrecdConfig};
use crate::error::RuntimeResult;
use crate::logging;
use crate::module::Module;
use crate::runtime::Core;

/// A configured bot: load config, set up logging, add modules, start.
///
/// ```rust,ignore
/// let mut bot = Discorrecd::initialize(ConfigLoader::new().file("config.json"))?;
/// bot.add::<TestModule>()?;
/// bot.start(&connector).await?;
/// ```
#[derive(Debug)]
pub struct Discorrecd {
    core: Core,
}

impl Discorrecd {
    /// Loads the configuration, initializes logging from it and builds the
    /// [`Core`].
    pub fn initialize(loader: ConfigLoader) -> RuntimeResult<Self> {
        let config = loader.load()?;
        logging::init_from_config(&config.logging);
        info!(version = env!("CARGO_PKG_VERSION"), "Discorrecd initialized");
        Ok(Self::from_config(config))
    }

    /// Builds the bot from an already loaded configuration.
    ///
    /// Logging is left untouched.
    pub fn from_config(config: DiscorrecdConfig) -> Self {
        Self {
            core: Core::new(config),
        }
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    /// Adds a module. See [`Core::add`].
    pub fn add<M: Module>(&mut self) -> RuntimeResult<Arc<M>> {
        self.core.add::<M>()
    }

    /// Connects and runs until the connection ends. See [`Core::start`].
    pub async fn start(&self, connector: &dyn Connector) -> RuntimeResult<()> {
        self.core.start(connector).await
    }
}
