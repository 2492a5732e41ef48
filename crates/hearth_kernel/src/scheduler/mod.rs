//! # Scheduler
//!
//! Two nominal execution lanes (sync and async) with delayed and fixed-rate
//! repeating tasks. The kernel ships [`VirtualScheduler`], which only runs
//! work when it is drained and only moves time when told to. That makes tick
//! logic fully deterministic in tests; a host driver turns it into a real-time
//! scheduler by advancing it from a timer.

mod clock;
mod virtual_scheduler;

pub use clock::{Clock, DeterministicClock};
pub use virtual_scheduler::VirtualScheduler;

use crate::error::TaskError;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A unit of scheduled work.
pub type Task = Box<dyn FnMut() -> Result<(), TaskError> + Send + 'static>;

/// Execution lane. The kernel only keeps the two queues apart; what "sync"
/// and "async" mean is up to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    Sync,
    Async,
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lane::Sync => f.write_str("sync"),
            Lane::Async => f.write_str("async"),
        }
    }
}

/// Cancellation handle for a scheduled task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stops future executions. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Plugin-facing scheduling surface.
///
/// Implementors provide [`schedule`](Scheduler::schedule); the lane-specific
/// helpers are thin wrappers over it.
pub trait Scheduler: Send + Sync {
    /// Queues `task` on `lane`, first due after `delay`, then every
    /// `interval` if one is given.
    fn schedule(&self, lane: Lane, delay: Duration, interval: Option<Duration>, task: Task) -> TaskHandle;

    fn run_sync(&self, task: Task) -> TaskHandle {
        self.schedule(Lane::Sync, Duration::ZERO, None, task)
    }

    fn run_async(&self, task: Task) -> TaskHandle {
        self.schedule(Lane::Async, Duration::ZERO, None, task)
    }

    fn run_sync_delayed(&self, delay: Duration, task: Task) -> TaskHandle {
        self.schedule(Lane::Sync, delay, None, task)
    }

    fn run_async_delayed(&self, delay: Duration, task: Task) -> TaskHandle {
        self.schedule(Lane::Async, delay, None, task)
    }

    fn run_sync_repeating(&self, initial_delay: Duration, interval: Duration, task: Task) -> TaskHandle {
        self.schedule(Lane::Sync, initial_delay, Some(interval), task)
    }

    fn run_async_repeating(&self, initial_delay: Duration, interval: Duration, task: Task) -> TaskHandle {
        self.schedule(Lane::Async, initial_delay, Some(interval), task)
    }
}
