//! Boundary a host implements to run the kernel.
//!
//! The kernel makes no assumptions about the host's threading model, tick
//! loop or IO. Everything host-specific reaches it through this trait.

use crate::commands::CommandBridge;
use crate::logging::LoggerFactory;
use crate::scheduler::{Clock, Scheduler};
use std::sync::Arc;

pub trait Platform: Send + Sync {
    /// Stable identifier for diagnostics, e.g. `"standalone"`.
    fn platform_id(&self) -> &str;

    fn clock(&self) -> Arc<dyn Clock>;

    fn loggers(&self) -> Arc<dyn LoggerFactory>;

    /// Scheduler backing both lanes. The host defines what the lanes mean.
    fn scheduler(&self) -> Arc<dyn Scheduler>;

    /// Hook that mirrors kernel commands into the host's command system.
    fn commands(&self) -> Arc<dyn CommandBridge>;
}
