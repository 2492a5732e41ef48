/// Registry decorator that mirrors registrations into a host command system
use super::{CommandContext, CommandDefinition, CommandRegistry, CommandResult};
use crate::error::CommandError;
use std::sync::Arc;
use tracing::trace;

/// Host-side hook told about every command that appears or disappears.
///
/// Hosts typically use it to expose kernel commands in their own command
/// tree and forward invocations back through [`CommandRegistry::dispatch`].
pub trait CommandBridge: Send + Sync {
    fn on_register(&self, definition: &CommandDefinition);
    fn on_unregister(&self, name: &str);
}

/// Bridge for hosts without a native command system.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCommandBridge;

impl CommandBridge for NoopCommandBridge {
    fn on_register(&self, _definition: &CommandDefinition) {}
    fn on_unregister(&self, _name: &str) {}
}

/// Wraps a registry and notifies a [`CommandBridge`] after each successful
/// registration or removal. Failed operations are not forwarded.
pub struct BridgedCommandRegistry {
    inner: Arc<dyn CommandRegistry>,
    bridge: Arc<dyn CommandBridge>,
}

impl BridgedCommandRegistry {
    pub fn new(inner: Arc<dyn CommandRegistry>, bridge: Arc<dyn CommandBridge>) -> Self {
        Self { inner, bridge }
    }
}

impl CommandRegistry for BridgedCommandRegistry {
    fn register(&self, definition: CommandDefinition) -> Result<(), CommandError> {
        let mirrored = definition.clone();
        self.inner.register(definition)?;
        trace!("🔗 Bridging command '{}'", mirrored.name());
        self.bridge.on_register(&mirrored);
        Ok(())
    }

    fn unregister(&self, name: &str) -> bool {
        let removed = self.inner.unregister(name);
        if removed {
            self.bridge.on_unregister(name);
        }
        removed
    }

    fn dispatch(&self, context: &CommandContext) -> CommandResult {
        self.inner.dispatch(context)
    }

    fn contains(&self, name: &str) -> bool {
        self.inner.contains(name)
    }

    fn resolve(&self, label: &str) -> Option<String> {
        self.inner.resolve(label)
    }

    fn names(&self) -> Vec<String> {
        self.inner.names()
    }
}
