//! Platform for running the kernel as a standalone process.

use hearth_kernel::commands::{CommandBridge, NoopCommandBridge};
use hearth_kernel::logging::{LoggerFactory, TracingLoggerFactory};
use hearth_kernel::platform::Platform;
use hearth_kernel::scheduler::{Clock, DeterministicClock, Scheduler, VirtualScheduler};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Standalone host: a virtual scheduler advanced by a
/// [`RealtimeDriver`](crate::driver::RealtimeDriver), loggers forwarding to
/// `tracing`, and no native command system.
#[derive(Debug)]
pub struct StandalonePlatform {
    clock: Arc<DeterministicClock>,
    scheduler: Arc<VirtualScheduler>,
}

impl StandalonePlatform {
    /// Creates the platform with its clock seeded from the system wall clock.
    pub fn new() -> Self {
        let now_millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Self::with_start_millis(now_millis)
    }

    pub fn with_start_millis(start_epoch_millis: u64) -> Self {
        let clock = Arc::new(DeterministicClock::new(start_epoch_millis));
        Self {
            scheduler: Arc::new(VirtualScheduler::with_clock(clock.clone())),
            clock,
        }
    }

    /// Concrete scheduler handle, for the driver.
    pub fn virtual_scheduler(&self) -> Arc<VirtualScheduler> {
        self.scheduler.clone()
    }
}

impl Default for StandalonePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for StandalonePlatform {
    fn platform_id(&self) -> &str {
        "standalone"
    }

    fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    fn loggers(&self) -> Arc<dyn LoggerFactory> {
        Arc::new(TracingLoggerFactory)
    }

    fn scheduler(&self) -> Arc<dyn Scheduler> {
        self.scheduler.clone()
    }

    fn commands(&self) -> Arc<dyn CommandBridge> {
        Arc::new(NoopCommandBridge)
    }
}
