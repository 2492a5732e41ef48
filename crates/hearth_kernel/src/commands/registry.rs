/// Command registry implementation
use super::{normalize, CommandContext, CommandDefinition, CommandResult};
use crate::error::CommandError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Plugin-facing command registry.
pub trait CommandRegistry: Send + Sync {
    /// Registers a command under its normalized name and aliases.
    fn register(&self, definition: CommandDefinition) -> Result<(), CommandError>;

    /// Removes a command and all of its aliases. Returns whether anything was removed.
    fn unregister(&self, name: &str) -> bool;

    /// Routes `context.label` to a command and runs it.
    fn dispatch(&self, context: &CommandContext) -> CommandResult;

    /// Whether a command with this primary name exists.
    fn contains(&self, name: &str) -> bool;

    /// Primary name the label resolves to, if any.
    fn resolve(&self, label: &str) -> Option<String>;

    /// Registered primary names, sorted.
    fn names(&self) -> Vec<String>;
}

#[derive(Default)]
struct RegistryState {
    by_name: HashMap<String, Arc<CommandDefinition>>,
    /// alias -> primary name
    aliases: HashMap<String, String>,
}

impl RegistryState {
    fn owner_of(&self, key: &str) -> Option<&str> {
        match self.by_name.get_key_value(key) {
            Some((name, _)) => Some(name.as_str()),
            None => self.aliases.get(key).map(String::as_str),
        }
    }
}

/// In-memory registry with a flat, case-insensitive namespace.
///
/// Names and aliases share one namespace: a primary name may not shadow an
/// alias and vice versa. All validation happens under a single write lock, so a
/// rejected registration leaves the registry untouched.
///
/// # Examples
///
/// ```rust
/// use hearth_kernel::commands::{CommandDefinition, CommandRegistry, CommandResult, SimpleCommandRegistry};
///
/// let registry = SimpleCommandRegistry::new();
/// registry
///     .register(
///         CommandDefinition::builder("ping")
///             .alias("p")
///             .executor(|_| CommandResult::Success)
///             .build()
///             .unwrap(),
///     )
///     .unwrap();
///
/// assert_eq!(registry.resolve("P").as_deref(), Some("ping"));
/// ```
#[derive(Default)]
pub struct SimpleCommandRegistry {
    state: RwLock<RegistryState>,
}

impl SimpleCommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the definition for a label, aliases first.
    pub fn definition(&self, label: &str) -> Option<Arc<CommandDefinition>> {
        let key = normalize(label);
        let state = self.state.read();
        let name = state.aliases.get(&key).unwrap_or(&key);
        state.by_name.get(name).cloned()
    }
}

impl std::fmt::Debug for SimpleCommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("SimpleCommandRegistry")
            .field("commands", &state.by_name.len())
            .field("aliases", &state.aliases.len())
            .finish()
    }
}

impl CommandRegistry for SimpleCommandRegistry {
    fn register(&self, definition: CommandDefinition) -> Result<(), CommandError> {
        let name = normalize(definition.name());
        if name.is_empty() {
            return Err(CommandError::BlankName);
        }

        let mut aliases: Vec<String> = Vec::new();
        for raw in definition.aliases() {
            let alias = normalize(raw);
            if alias.is_empty() {
                return Err(CommandError::BlankAlias(name));
            }
            if alias != name && !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }

        let mut state = self.state.write();
        if state.owner_of(&name).is_some() {
            return Err(CommandError::DuplicateName(name));
        }
        for alias in &aliases {
            if let Some(existing) = state.owner_of(alias) {
                return Err(CommandError::DuplicateAlias {
                    alias: alias.clone(),
                    existing: existing.to_string(),
                });
            }
        }

        for alias in &aliases {
            state.aliases.insert(alias.clone(), name.clone());
        }
        state.by_name.insert(name.clone(), Arc::new(definition));

        debug!("📝 Registered command '{}' with aliases {:?}", name, aliases);
        Ok(())
    }

    fn unregister(&self, name: &str) -> bool {
        let key = normalize(name);
        let mut state = self.state.write();
        if state.by_name.remove(&key).is_none() {
            return false;
        }
        state.aliases.retain(|_, owner| *owner != key);
        debug!("🗑️ Unregistered command '{}'", key);
        true
    }

    fn dispatch(&self, context: &CommandContext) -> CommandResult {
        let Some(definition) = self.definition(&context.label) else {
            return CommandResult::UsageError(format!("Unknown command: {}", context.label.trim()));
        };

        if let Some(permission) = definition.permission() {
            if !context.sender.has_permission(permission) {
                trace!(
                    "⛔ {} lacks '{}' for command '{}'",
                    context.sender.name(),
                    permission,
                    definition.name()
                );
                return CommandResult::NoPermission;
            }
        }

        definition.execute(context)
    }

    fn contains(&self, name: &str) -> bool {
        self.state.read().by_name.contains_key(&normalize(name))
    }

    fn resolve(&self, label: &str) -> Option<String> {
        self.definition(label).map(|def| normalize(def.name()))
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().by_name.keys().cloned().collect();
        names.sort();
        names
    }
}
