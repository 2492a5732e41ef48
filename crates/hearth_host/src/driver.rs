//! Real-time driver for the virtual scheduler
//!
//! Turns the kernel's [`VirtualScheduler`] into a wall-clock scheduler: on
//! every tick the virtual clock is advanced by the real time that passed and
//! both lanes are drained.

use hearth_kernel::scheduler::VirtualScheduler;
use hearth_kernel::SchedulerError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

pub struct RealtimeDriver {
    scheduler: Arc<VirtualScheduler>,
    tick_interval: Duration,
}

impl RealtimeDriver {
    /// Creates a driver ticking every `tick_interval`, at least once per millisecond.
    pub fn new(scheduler: Arc<VirtualScheduler>, tick_interval: Duration) -> Self {
        Self {
            scheduler,
            tick_interval: tick_interval.max(Duration::from_millis(1)),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Runs the tick loop until `shutdown` becomes `true` or its sender is
    /// dropped. Returns the number of ticks performed.
    ///
    /// Task failures are logged and never stop the loop.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> u64 {
        if *shutdown.borrow() {
            return 0;
        }

        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let started = Instant::now();
        let mut advanced = Duration::ZERO;
        let mut tick_count: u64 = 0;

        info!("🕒 Scheduler driver started with interval: {:?}", self.tick_interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let step = started.elapsed().saturating_sub(advanced);
                    advanced += step;
                    tick_count += 1;
                    self.tick(step);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("🛑 Scheduler driver stopped after {} ticks", tick_count);
        tick_count
    }

    /// Advances the virtual clock by `elapsed` and drains both lanes.
    /// Returns how many tasks ran.
    pub fn tick(&self, elapsed: Duration) -> usize {
        self.scheduler.clock().advance_by(elapsed);
        let ran = drain(|| self.scheduler.run_due_sync()) + drain(|| self.scheduler.run_due_async());
        if ran > 0 {
            debug!("⏱️ Tick ran {} task(s)", ran);
        }
        ran
    }
}

/// Drains one lane, logging failures and draining again until it is clean.
/// Each failure removes the failing task, so this terminates. Returns how many
/// tasks completed; failed tasks are not counted.
fn drain(mut run_due: impl FnMut() -> Result<usize, SchedulerError>) -> usize {
    let mut ran = 0;
    loop {
        match run_due() {
            Ok(count) => return ran + count,
            Err(e) => {
                error!("❌ Scheduled task failed: {}", e);
                let SchedulerError::TaskFailed { executed, .. } = e;
                ran += executed;
            }
        }
    }
}

impl std::fmt::Debug for RealtimeDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeDriver")
            .field("tick_interval", &self.tick_interval)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_kernel::scheduler::{Clock, Scheduler};
    use hearth_kernel::TaskError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_tick_keeps_draining_after_failure() {
        let scheduler = Arc::new(VirtualScheduler::new(0));
        let driver = RealtimeDriver::new(scheduler.clone(), Duration::from_millis(10));
        let runs = Arc::new(AtomicUsize::new(0));

        scheduler.run_sync(Box::new(|| -> Result<(), TaskError> {
            Err(TaskError::Failed("boom".to_string()))
        }));
        let counter = runs.clone();
        scheduler.run_sync_delayed(
            Duration::from_millis(10),
            Box::new(move || -> Result<(), TaskError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );

        assert_eq!(driver.tick(Duration::from_millis(10)), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_sync(), 0);
    }

    #[test]
    fn test_tick_counts_successes_around_failure() {
        let scheduler = Arc::new(VirtualScheduler::new(0));
        let driver = RealtimeDriver::new(scheduler.clone(), Duration::from_millis(10));
        let runs = Arc::new(AtomicUsize::new(0));

        for fails in [false, false, true, false] {
            let counter = runs.clone();
            scheduler.run_sync(Box::new(move || -> Result<(), TaskError> {
                if fails {
                    return Err(TaskError::Failed("boom".to_string()));
                }
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }

        assert_eq!(driver.tick(Duration::ZERO), 3);
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_tick_honors_sub_millisecond_steps() {
        let scheduler = Arc::new(VirtualScheduler::new(0));
        let driver = RealtimeDriver::new(scheduler.clone(), Duration::from_millis(1));
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = runs.clone();
        scheduler.run_async_delayed(
            Duration::from_micros(900),
            Box::new(move || -> Result<(), TaskError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );

        assert_eq!(driver.tick(Duration::from_micros(600)), 0);
        assert_eq!(driver.tick(Duration::from_micros(300)), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let driver = RealtimeDriver::new(Arc::new(VirtualScheduler::new(0)), Duration::ZERO);
        assert_eq!(driver.tick_interval(), Duration::from_millis(1));
    }

    #[tokio::test]
    async fn test_run_drives_scheduler_until_shutdown() {
        let scheduler = Arc::new(VirtualScheduler::new(0));
        let driver = RealtimeDriver::new(scheduler.clone(), Duration::from_millis(5));
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = runs.clone();
        scheduler.run_async_delayed(
            Duration::from_millis(20),
            Box::new(move || -> Result<(), TaskError> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move { driver.run(shutdown_rx).await });

        tokio::time::sleep(Duration::from_millis(150)).await;
        shutdown_tx.send(true).unwrap();
        let ticks = handle.await.unwrap();

        assert!(ticks > 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(scheduler.clock().now_epoch_millis() >= 20);
    }

    #[tokio::test]
    async fn test_run_returns_immediately_when_already_shut_down() {
        let driver = RealtimeDriver::new(Arc::new(VirtualScheduler::new(0)), Duration::from_millis(5));
        let (_tx, rx) = watch::channel(true);
        assert_eq!(driver.run(rx).await, 0);
    }
}
