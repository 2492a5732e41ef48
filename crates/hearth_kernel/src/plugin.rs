//! Plugin lifecycle and explicit registration.
//!
//! Lifecycle ordering is the host's job; the kernel only defines the
//! callbacks. [`Registrar`] collects a plugin's commands and listeners and
//! applies them all-or-nothing, handing back a [`Registration`] that undoes
//! everything on disable.

use crate::commands::{CommandDefinition, CommandRegistry};
use crate::context::PluginContext;
use crate::error::{EventError, PluginError};
use crate::events::{Event, EventBus, EventPriority, Subscription};
use std::fmt;
use std::sync::Arc;

/// Plugin entry point.
///
/// # Examples
///
/// ```rust
/// use hearth_kernel::context::PluginContext;
/// use hearth_kernel::error::PluginError;
/// use hearth_kernel::plugin::KernelPlugin;
///
/// struct Greeter;
///
/// impl KernelPlugin for Greeter {
///     fn on_enable(&mut self, ctx: &PluginContext) -> Result<(), PluginError> {
///         ctx.logger().info("👋 Greeter enabled");
///         Ok(())
///     }
/// }
/// ```
pub trait KernelPlugin: Send {
    /// Called once the plugin is constructed. Wire services here.
    fn on_load(&mut self, _ctx: &PluginContext) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called when the plugin becomes active. Register commands, listeners and tasks here.
    fn on_enable(&mut self, _ctx: &PluginContext) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called before the plugin is unloaded. Cancel tasks and release resources.
    fn on_disable(&mut self, _ctx: &PluginContext) -> Result<(), PluginError> {
        Ok(())
    }
}

type PendingListener = Box<dyn FnOnce(&EventBus) -> Subscription + Send>;

/// Collects commands and listeners to register in one step.
#[derive(Default)]
pub struct Registrar {
    commands: Vec<CommandDefinition>,
    listeners: Vec<PendingListener>,
}

impl Registrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(mut self, definition: CommandDefinition) -> Self {
        self.commands.push(definition);
        self
    }

    pub fn listener<E, F>(mut self, priority: EventPriority, ignore_cancelled: bool, listener: F) -> Self
    where
        E: Event,
        F: Fn(&mut E) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.listeners
            .push(Box::new(move |bus: &EventBus| bus.subscribe(priority, ignore_cancelled, listener)));
        self
    }

    /// Registers everything against `ctx`.
    ///
    /// On the first failure every command and listener applied so far is
    /// removed again and the error is returned.
    pub fn apply(self, ctx: &PluginContext) -> Result<Registration, PluginError> {
        let mut registration = Registration {
            registry: ctx.commands().clone(),
            commands: Vec::with_capacity(self.commands.len()),
            subscriptions: Vec::with_capacity(self.listeners.len()),
        };

        for definition in self.commands {
            let name = definition.name().to_string();
            if let Err(e) = ctx.commands().register(definition) {
                ctx.logger().warn(&format!("Registration of '{name}' failed, rolling back: {e}"));
                registration.revoke();
                return Err(e.into());
            }
            registration.commands.push(name);
        }

        for subscribe in self.listeners {
            registration.subscriptions.push(subscribe(ctx.events()));
        }

        ctx.logger().debug(&format!(
            "Registered {} command(s) and {} listener(s)",
            registration.commands.len(),
            registration.subscriptions.len()
        ));
        Ok(registration)
    }
}

impl fmt::Debug for Registrar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registrar")
            .field("commands", &self.commands)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Everything a [`Registrar`] applied. Dropping it keeps the registrations.
pub struct Registration {
    registry: Arc<dyn CommandRegistry>,
    commands: Vec<String>,
    subscriptions: Vec<Subscription>,
}

impl Registration {
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Unregisters every command and listener. Calling it again is a no-op.
    pub fn revoke(&mut self) {
        for name in self.commands.drain(..) {
            self.registry.unregister(&name);
        }
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("commands", &self.commands)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}
