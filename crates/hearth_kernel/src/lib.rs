//! # Hearth Kernel
//!
//! A host-agnostic runtime kernel for game server plugins. The kernel owns no
//! threads, opens no sockets and makes no assumptions about the server it runs
//! in; hosts plug in through the [`Platform`](platform::Platform) trait.
//!
//! ## Core Features
//!
//! - **Event bus**: synchronous, type-exact, priority ordered, cancellation aware
//! - **Commands**: flat case-insensitive namespace with aliases and permissions
//! - **Virtual scheduler**: sync and async lanes driven by an advanceable clock
//! - **Versioned config**: text documents with a version header and migrations
//! - **Services**: one shared instance per type
//!
//! ## Quick Start Example
//!
//! ```rust
//! use hearth_kernel::prelude::*;
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! struct Tick(u64);
//! impl Event for Tick {}
//!
//! let events = EventBus::new();
//! events.on(|tick: &mut Tick| {
//!     tracing::debug!("tick {}", tick.0);
//!     Ok(())
//! });
//!
//! let scheduler = VirtualScheduler::new(0);
//! scheduler.run_sync_repeating(Duration::ZERO, Duration::from_millis(50), Box::new(move || -> Result<(), TaskError> {
//!     events.post(Tick(0))?;
//!     Ok(())
//! }));
//! assert_eq!(scheduler.advance_by(Duration::from_millis(100), true).unwrap(), 3);
//! ```

pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod logging;
pub mod platform;
pub mod plugin;
pub mod scheduler;
pub mod services;

pub use context::{KernelRuntime, PluginContext};
pub use error::*;
pub use plugin::{KernelPlugin, Registrar, Registration};

/// Commonly used types for plugin authors.
pub mod prelude {
    pub use crate::commands::{
        CommandContext, CommandDefinition, CommandRegistry, CommandResult, CommandSender, Permission,
    };
    pub use crate::config::{ConfigKey, ConfigMigration, JsonConfigCodec, TomlConfigCodec};
    pub use crate::context::{KernelRuntime, PluginContext, ThreadGuards};
    pub use crate::error::{
        CommandError, ConfigError, EventError, PluginError, SchedulerError, ServiceError, TaskError,
    };
    pub use crate::events::{Cancellable, Event, EventBus, EventPriority, Subscription};
    pub use crate::logging::{KernelLogger, LogLevel};
    pub use crate::plugin::{KernelPlugin, Registrar, Registration};
    pub use crate::scheduler::{Clock, Scheduler, TaskHandle, VirtualScheduler};
}
