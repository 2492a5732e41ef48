//! # Commands
//!
//! Flat namespace of named, aliased commands with permission gating.
//!
//! The registry does no IO and no argument parsing: hosts tokenize input,
//! build a [`CommandContext`] and route the returned [`CommandResult`] back to
//! the sender however they like.

mod bridge;
mod registry;

pub use bridge::{BridgedCommandRegistry, CommandBridge, NoopCommandBridge};
pub use registry::{CommandRegistry, SimpleCommandRegistry};

use crate::error::CommandError;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Message carried by [`CommandResult::NoPermission`].
pub const NO_PERMISSION_MESSAGE: &str = "You do not have permission to use that command.";

/// Opaque permission identifier. How permissions are checked is up to the
/// [`CommandSender`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Permission(String);

impl Permission {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Permission {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Anything that can run commands: a player, the console, a script.
pub trait CommandSender: Send + Sync {
    fn name(&self) -> &str;
    fn send_message(&self, message: &str);
    fn has_permission(&self, permission: &Permission) -> bool;
}

/// Per-invocation input to a command. Not stored by the registry.
#[derive(Clone)]
pub struct CommandContext {
    pub sender: Arc<dyn CommandSender>,
    /// The name or alias the sender typed
    pub label: String,
    /// Already tokenized arguments
    pub args: Vec<String>,
}

impl CommandContext {
    pub fn new(sender: Arc<dyn CommandSender>, label: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            sender,
            label: label.into(),
            args,
        }
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("sender", &self.sender.name())
            .field("label", &self.label)
            .field("args", &self.args)
            .finish()
    }
}

/// Outcome of a dispatch. Always returned, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Success,
    /// The sender lacks the command's permission
    NoPermission,
    /// Bad input for the chosen route, including unknown commands
    UsageError(String),
    /// Caller-defined failure
    Failure(String),
}

impl CommandResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandResult::Success)
    }

    /// User-facing message for the failure variants.
    pub fn message(&self) -> Option<&str> {
        match self {
            CommandResult::Success => None,
            CommandResult::NoPermission => Some(NO_PERMISSION_MESSAGE),
            CommandResult::UsageError(message) | CommandResult::Failure(message) => Some(message),
        }
    }
}

/// Function invoked when a command is dispatched.
pub type CommandExecutor = Arc<dyn Fn(&CommandContext) -> CommandResult + Send + Sync>;

/// A named command with aliases, an optional permission and an executor.
#[derive(Clone)]
pub struct CommandDefinition {
    name: String,
    aliases: BTreeSet<String>,
    description: Option<String>,
    permission: Option<Permission>,
    executor: CommandExecutor,
}

impl CommandDefinition {
    /// Starts a fluent builder.
    ///
    /// ```rust
    /// use hearth_kernel::commands::{CommandDefinition, CommandResult};
    ///
    /// let ping = CommandDefinition::builder("ping")
    ///     .alias("p")
    ///     .description("Replies with pong")
    ///     .executor(|ctx| {
    ///         ctx.sender.send_message("pong");
    ///         CommandResult::Success
    ///     })
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(ping.name(), "ping");
    /// ```
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            name: name.into(),
            aliases: BTreeSet::new(),
            description: None,
            permission: None,
            executor: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.aliases.iter().map(String::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn permission(&self) -> Option<&Permission> {
        self.permission.as_ref()
    }

    pub fn execute(&self, context: &CommandContext) -> CommandResult {
        (self.executor)(context)
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("description", &self.description)
            .field("permission", &self.permission)
            .finish()
    }
}

/// Builder for [`CommandDefinition`].
pub struct CommandBuilder {
    name: String,
    aliases: BTreeSet<String>,
    description: Option<String>,
    permission: Option<Permission>,
    executor: Option<CommandExecutor>,
}

impl CommandBuilder {
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.insert(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn permission(mut self, permission: impl Into<Permission>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn executor<F>(mut self, executor: F) -> Self
    where
        F: Fn(&CommandContext) -> CommandResult + Send + Sync + 'static,
    {
        self.executor = Some(Arc::new(executor));
        self
    }

    pub fn build(self) -> Result<CommandDefinition, CommandError> {
        let executor = self
            .executor
            .ok_or_else(|| CommandError::MissingExecutor(self.name.clone()))?;
        Ok(CommandDefinition {
            name: self.name,
            aliases: self.aliases,
            description: self.description,
            permission: self.permission,
            executor,
        })
    }
}

/// Trim + lowercase, the normal form of names, aliases and labels.
pub(crate) fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}
