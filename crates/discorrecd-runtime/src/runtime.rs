//! Module loader and dispatcher owner.
//!
//! [`Core`] owns the two dispatchers (platform events and user commands) and
//! the [`CoreClient`]. Adding a module builds it, creates the command channels
//! it names and registers its bindings on both dispatchers, each filtered by
//! its category.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use discorrecd_core::{Category, Dispatcher, register_bindings};
use tracing::{debug, info};

use crate::client::{Connection, Connector, CoreClient, MESSAGE};
use crate::command::{CommandParser, router};
use crate::config::DiscorrecdConfig;
use crate::error::{RuntimeError, RuntimeResult};
use crate::module::{Module, ModuleContext};
use crate::payload::Payload;

struct LoadedModule {
    name: &'static str,
    type_id: TypeId,
    instance: Arc<dyn Any + Send + Sync>,
    handler_count: usize,
}

/// Owner of the dispatchers, the client and the loaded modules.
pub struct Core {
    config: Arc<DiscorrecdConfig>,
    events: Arc<Dispatcher<Payload>>,
    commands: Arc<Dispatcher<Payload>>,
    client: Arc<CoreClient>,
    modules: Vec<LoadedModule>,
}

impl Core {
    /// Builds the dispatchers and the client, and installs command routing
    /// as the first `message` observer.
    pub fn new(config: DiscorrecdConfig) -> Self {
        let events = Arc::new(Dispatcher::new());
        let commands = Arc::new(Dispatcher::new());
        let client = Arc::new(CoreClient::new(Arc::clone(&events)));

        let parser = CommandParser::new(config.command_prefix.clone());
        if let Some(channel) = events.get(MESSAGE) {
            channel.add(router(Arc::clone(&commands), parser));
        }

        Self {
            config: Arc::new(config),
            events,
            commands,
            client,
            modules: Vec::new(),
        }
    }

    pub fn config(&self) -> &Arc<DiscorrecdConfig> {
        &self.config
    }

    /// Returns the platform events dispatcher.
    pub fn events(&self) -> &Arc<Dispatcher<Payload>> {
        &self.events
    }

    /// Returns the commands dispatcher.
    pub fn commands(&self) -> &Arc<Dispatcher<Payload>> {
        &self.commands
    }

    pub fn client(&self) -> &Arc<CoreClient> {
        &self.client
    }

    /// Builds module `M` and registers its bindings.
    ///
    /// Fails with [`RuntimeError::ModuleExists`] if an `M` was already added.
    /// A binding naming an events channel the client does not emit fails with
    /// the dispatcher's `ChannelNotFound`, one without a method with
    /// `InvalidHandler`. Bindings are checked before the module is built, and
    /// a failed add leaves both dispatchers unchanged.
    pub fn add<M: Module>(&mut self) -> RuntimeResult<Arc<M>> {
        if self.contains::<M>() {
            return Err(RuntimeError::ModuleExists(M::NAME));
        }

        // Nothing is registered unless every binding can be.
        let bindings = M::bindings();
        for binding in &bindings {
            let category = binding.category();
            if category == &Category::EVENTS {
                binding.check(&self.events)?;
            } else if category == &Category::COMMANDS {
                binding.check_method()?;
            }
        }

        let ctx = ModuleContext::new(
            M::NAME,
            Arc::clone(&self.client),
            self.config.module_section(M::NAME),
            self.config.data_dir.clone(),
        );
        let instance = Arc::new(
            M::new(&ctx).map_err(|source| RuntimeError::ModuleInit {
                name: M::NAME,
                source,
            })?,
        );

        for binding in bindings.iter().filter(|b| b.category() == &Category::COMMANDS) {
            for name in binding.events() {
                self.commands.add(name.as_str());
            }
        }

        let events = register_bindings(&self.events, &Category::EVENTS, &instance, &bindings)?;
        let commands =
            register_bindings(&self.commands, &Category::COMMANDS, &instance, &bindings)?;

        info!(
            module = M::NAME,
            events = events.len(),
            commands = commands.len(),
            "Module added"
        );

        self.modules.push(LoadedModule {
            name: M::NAME,
            type_id: TypeId::of::<M>(),
            instance: instance.clone(),
            handler_count: events.len() + commands.len(),
        });
        Ok(instance)
    }

    /// Returns `true` if a module of type `M` was added.
    pub fn contains<M: Module>(&self) -> bool {
        self.modules.iter().any(|m| m.type_id == TypeId::of::<M>())
    }

    /// Returns the added instance of `M`.
    pub fn module<M: Module>(&self) -> Option<Arc<M>> {
        self.modules
            .iter()
            .find(|m| m.type_id == TypeId::of::<M>())
            .and_then(|m| Arc::clone(&m.instance).downcast::<M>().ok())
    }

    /// Returns the names of the added modules in insertion order.
    pub fn module_names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name).collect()
    }

    /// Logs in through `connector` and runs the client loop until the
    /// connection ends.
    ///
    /// Credentials are resolved first; missing ones fail before connecting.
    pub async fn start(&self, connector: &dyn Connector) -> RuntimeResult<()> {
        let credentials = self.config.credentials()?;
        info!(credentials = credentials.kind(), modules = ?self.module_names(), "Logging in");

        let Connection { gateway, events } = connector.connect(&credentials).await?;
        self.client.attach(gateway);

        let result = self.client.run(events).await;
        self.client.detach();
        debug!("Client detached");
        result.map_err(Into::into)
    }
}

impl fmt::Debug for Core {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modules: Vec<_> = self
            .modules
            .iter()
            .map(|m| (m.name, m.handler_count))
            .collect();
        f.debug_struct("Core")
            .field("events", &self.events)
            .field("commands", &self.commands)
            .field("modules", &modules)
            .finish()
    }
}
