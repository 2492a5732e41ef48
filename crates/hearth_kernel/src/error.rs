//! Error types for the Hearth kernel
//!
//! Every fallible kernel operation returns one of the enums below. Routing
//! failures (unknown command, missing permission) are deliberately absent:
//! those are ordinary [`CommandResult`](crate::commands::CommandResult) values.

use crate::scheduler::Lane;
use std::io::Error as IoError;
use thiserror::Error;

/// Errors raised by event listeners and surfaced from [`EventBus::post`](crate::events::EventBus::post).
#[derive(Debug, Error)]
pub enum EventError {
    /// A listener reported a failure while handling an event
    #[error("Handler execution error: {0}")]
    HandlerExecution(String),
    /// A listener failed with an arbitrary error value
    #[error("Handler error: {0}")]
    Handler(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Command registration errors.
///
/// These are contract violations; the registry is left unchanged whenever one
/// of them is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Command name must not be blank")]
    BlankName,

    #[error("Alias must not be blank (command '{0}')")]
    BlankAlias(String),

    #[error("Command already registered: {0}")]
    DuplicateName(String),

    #[error("Alias '{alias}' already registered for '{existing}'")]
    DuplicateAlias { alias: String, existing: String },

    #[error("Command '{0}' is missing an executor")]
    MissingExecutor(String),
}

/// Error returned by a scheduled task body.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task failed: {0}")]
    Failed(String),

    /// Posting an event from inside the task failed
    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors surfaced by the scheduler drain operations.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A task failed; it was removed from its queue and the drain stopped.
    /// `executed` counts the tasks that completed earlier in the same drain.
    #[error("{lane} task #{task_id} failed: {source}")]
    TaskFailed {
        lane: Lane,
        task_id: u64,
        executed: usize,
        #[source]
        source: TaskError,
    },
}

/// Text store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid config id: {0:?}")]
    InvalidId(String),

    #[error("Failed to read config {0}: {1}")]
    Read(String, IoError),

    #[error("Failed to write config {0}: {1}")]
    Write(String, IoError),
}

/// Codec errors. Decoding failures are recovered by the config manager;
/// encoding failures are reported.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),
}

/// Config manager errors. Only storage and encoding problems end up here;
/// undecodable or partially migrated documents are healed locally.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to encode config '{id}': {source}")]
    Encode {
        id: String,
        #[source]
        source: CodecError,
    },
}

/// Service registry errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Service already registered for type {0}")]
    AlreadyRegistered(&'static str),

    #[error("Missing service for type {0}")]
    Missing(&'static str),
}

/// Errors that can occur during plugin lifecycle callbacks and registration.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Plugin initialization failed
    #[error("Plugin initialization failed: {0}")]
    InitializationFailed(String),
    /// Error occurred during plugin execution
    #[error("Plugin execution error: {0}")]
    ExecutionError(String),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Event(#[from] EventError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}
