//! Plugin context and the runtime that hands it out.

use crate::commands::{BridgedCommandRegistry, CommandRegistry, SimpleCommandRegistry};
use crate::config::{ConfigManager, ConfigTextStore};
use crate::events::EventBus;
use crate::logging::KernelLogger;
use crate::platform::Platform;
use crate::scheduler::Scheduler;
use crate::services::ServiceRegistry;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Everything a plugin gets to talk to the kernel.
///
/// Cloning is cheap; every service is shared behind an `Arc`.
#[derive(Clone)]
pub struct PluginContext {
    plugin_id: Arc<str>,
    logger: Arc<dyn KernelLogger>,
    events: Arc<EventBus>,
    scheduler: Arc<dyn Scheduler>,
    commands: Arc<dyn CommandRegistry>,
    configs: Arc<ConfigManager>,
    services: Arc<ServiceRegistry>,
}

impl PluginContext {
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    /// Logger scoped to this plugin.
    pub fn logger(&self) -> &Arc<dyn KernelLogger> {
        &self.logger
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    pub fn commands(&self) -> &Arc<dyn CommandRegistry> {
        &self.commands
    }

    pub fn configs(&self) -> &Arc<ConfigManager> {
        &self.configs
    }

    pub fn services(&self) -> &Arc<ServiceRegistry> {
        &self.services
    }
}

impl fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContext")
            .field("plugin_id", &self.plugin_id)
            .field("logger", &self.logger.name())
            .finish_non_exhaustive()
    }
}

/// Debug-level markers documenting which lane code expects to run on.
///
/// Nothing is enforced; the markers only show up in logs.
#[derive(Clone)]
pub struct ThreadGuards {
    logger: Arc<dyn KernelLogger>,
}

impl ThreadGuards {
    pub fn new(logger: Arc<dyn KernelLogger>) -> Self {
        Self { logger }
    }

    pub fn expect_sync(&self, note: &str) {
        self.logger.debug(&format!("ThreadGuard(sync): {note}"));
    }

    pub fn expect_async(&self, note: &str) {
        self.logger.debug(&format!("ThreadGuard(async): {note}"));
    }
}

/// Wires one shared set of kernel services on top of a [`Platform`].
///
/// # Examples
///
/// ```rust,no_run
/// use hearth_kernel::config::InMemoryConfigTextStore;
/// use hearth_kernel::context::KernelRuntime;
/// use hearth_kernel::platform::Platform;
/// use std::sync::Arc;
///
/// fn boot(platform: Arc<dyn Platform>) {
///     let runtime = KernelRuntime::new(platform, Arc::new(InMemoryConfigTextStore::new()));
///     let ctx = runtime.plugin_context("economy");
///     ctx.logger().info("ready");
/// }
/// ```
pub struct KernelRuntime {
    platform: Arc<dyn Platform>,
    events: Arc<EventBus>,
    scheduler: Arc<dyn Scheduler>,
    commands: Arc<dyn CommandRegistry>,
    configs: Arc<ConfigManager>,
    services: Arc<ServiceRegistry>,
}

impl KernelRuntime {
    pub fn new(platform: Arc<dyn Platform>, store: Arc<dyn ConfigTextStore>) -> Self {
        let loggers = platform.loggers();
        let commands: Arc<dyn CommandRegistry> = Arc::new(BridgedCommandRegistry::new(
            Arc::new(SimpleCommandRegistry::new()),
            platform.commands(),
        ));

        info!("🚀 Kernel runtime started on platform '{}'", platform.platform_id());

        Self {
            events: Arc::new(EventBus::new()),
            scheduler: platform.scheduler(),
            commands,
            configs: Arc::new(ConfigManager::new(store, loggers.logger("config"))),
            services: Arc::new(ServiceRegistry::new()),
            platform,
        }
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    pub fn commands(&self) -> &Arc<dyn CommandRegistry> {
        &self.commands
    }

    pub fn configs(&self) -> &Arc<ConfigManager> {
        &self.configs
    }

    pub fn services(&self) -> &Arc<ServiceRegistry> {
        &self.services
    }

    /// Builds a context for `plugin_id` sharing this runtime's services.
    pub fn plugin_context(&self, plugin_id: &str) -> PluginContext {
        PluginContext {
            plugin_id: Arc::from(plugin_id),
            logger: self.platform.loggers().logger(plugin_id),
            events: self.events.clone(),
            scheduler: self.scheduler.clone(),
            commands: self.commands.clone(),
            configs: self.configs.clone(),
            services: self.services.clone(),
        }
    }

    pub fn thread_guards(&self, plugin_id: &str) -> ThreadGuards {
        ThreadGuards::new(self.platform.loggers().logger(&format!("{plugin_id}-threading")))
    }
}

impl fmt::Debug for KernelRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelRuntime")
            .field("platform", &self.platform.platform_id())
            .field("events", &self.events)
            .field("commands", &self.commands.names())
            .finish_non_exhaustive()
    }
}
