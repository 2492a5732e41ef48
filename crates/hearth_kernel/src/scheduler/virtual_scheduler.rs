use super::{Clock, DeterministicClock, Lane, Scheduler, Task, TaskHandle};
use crate::error::SchedulerError;
use parking_lot::Mutex;
use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, trace};

struct ScheduledTask {
    id: u64,
    due_nanos: u64,
    interval_nanos: Option<u64>,
    handle: TaskHandle,
    task: Task,
}

impl PartialEq for ScheduledTask {
    fn eq(&self, other: &Self) -> bool {
        self.due_nanos == other.due_nanos && self.id == other.id
    }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledTask {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        (self.due_nanos, self.id).cmp(&(other.due_nanos, other.id))
    }
}

type TaskQueue = Mutex<BinaryHeap<Reverse<ScheduledTask>>>;

fn to_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Queue-based scheduler driven by a [`DeterministicClock`].
///
/// Nothing runs until [`run_due_sync`](VirtualScheduler::run_due_sync) or
/// [`run_due_async`](VirtualScheduler::run_due_async) is called. Each drain
/// executes every task whose due time is not after the clock's monotonic
/// reading, in (due time, scheduling order) order. Wall-clock jumps made with
/// [`DeterministicClock::set_epoch_millis`] never move pending tasks.
/// Repeating tasks are re-queued at their previous due time plus the
/// interval, so a late drain catches up.
///
/// # Failure policy
///
/// A task returning `Err` is dropped from its queue, even if it repeats, and
/// the drain stops with [`SchedulerError::TaskFailed`], which reports how many
/// tasks ran before the failure. Other due tasks stay queued for the next drain.
///
/// # Examples
///
/// ```rust
/// use hearth_kernel::scheduler::{Scheduler, VirtualScheduler};
/// use std::time::Duration;
///
/// let scheduler = VirtualScheduler::new(0);
/// scheduler.run_sync_delayed(Duration::from_millis(50), Box::new(|| Ok(())));
///
/// assert_eq!(scheduler.advance_by(Duration::from_millis(49), true).unwrap(), 0);
/// assert_eq!(scheduler.advance_by(Duration::from_millis(1), true).unwrap(), 1);
/// ```
pub struct VirtualScheduler {
    clock: Arc<DeterministicClock>,
    next_id: AtomicU64,
    sync_queue: TaskQueue,
    async_queue: TaskQueue,
}

impl VirtualScheduler {
    /// Creates a scheduler with its own clock starting at `start_epoch_millis`.
    pub fn new(start_epoch_millis: u64) -> Self {
        Self::with_clock(Arc::new(DeterministicClock::new(start_epoch_millis)))
    }

    pub fn with_clock(clock: Arc<DeterministicClock>) -> Self {
        Self {
            clock,
            next_id: AtomicU64::new(1),
            sync_queue: Mutex::new(BinaryHeap::new()),
            async_queue: Mutex::new(BinaryHeap::new()),
        }
    }

    pub fn clock(&self) -> Arc<DeterministicClock> {
        self.clock.clone()
    }

    fn queue(&self, lane: Lane) -> &TaskQueue {
        match lane {
            Lane::Sync => &self.sync_queue,
            Lane::Async => &self.async_queue,
        }
    }

    /// Runs every due sync task. Returns how many executed.
    pub fn run_due_sync(&self) -> Result<usize, SchedulerError> {
        self.run_due(Lane::Sync)
    }

    /// Runs every due async task. Returns how many executed.
    pub fn run_due_async(&self) -> Result<usize, SchedulerError> {
        self.run_due(Lane::Async)
    }

    /// Moves the clock forward and, if asked, drains the sync lane then the
    /// async lane.
    pub fn advance_by(&self, duration: Duration, run_due_after_advance: bool) -> Result<usize, SchedulerError> {
        self.clock.advance_by(duration);
        if !run_due_after_advance {
            return Ok(0);
        }
        let ran_sync = self.run_due_sync()?;
        let ran_async = self.run_due_async()?;
        Ok(ran_sync + ran_async)
    }

    /// Number of queued sync tasks, cancelled ones included until drained.
    pub fn pending_sync(&self) -> usize {
        self.sync_queue.lock().len()
    }

    /// Number of queued async tasks, cancelled ones included until drained.
    pub fn pending_async(&self) -> usize {
        self.async_queue.lock().len()
    }

    fn pop_due(&self, lane: Lane) -> Option<ScheduledTask> {
        let now = self.clock.monotonic_nanos();
        let mut queue = self.queue(lane).lock();
        if queue.peek().is_some_and(|Reverse(head)| head.due_nanos <= now) {
            queue.pop().map(|Reverse(task)| task)
        } else {
            None
        }
    }

    fn run_due(&self, lane: Lane) -> Result<usize, SchedulerError> {
        let mut executed = 0;

        // The queue lock is released while a task runs, so tasks may schedule more work.
        while let Some(mut scheduled) = self.pop_due(lane) {
            if scheduled.handle.is_cancelled() {
                trace!("Skipping cancelled {} task #{}", lane, scheduled.id);
                continue;
            }

            if let Err(source) = (scheduled.task)() {
                error!("❌ {} task #{} failed: {}", lane, scheduled.id, source);
                return Err(SchedulerError::TaskFailed {
                    lane,
                    task_id: scheduled.id,
                    executed,
                    source,
                });
            }
            executed += 1;

            if let Some(interval) = scheduled.interval_nanos {
                if !scheduled.handle.is_cancelled() {
                    scheduled.due_nanos = scheduled.due_nanos.saturating_add(interval);
                    self.queue(lane).lock().push(Reverse(scheduled));
                }
            }
        }

        if executed > 0 {
            trace!("⏱️ Ran {} {} task(s)", executed, lane);
        }
        Ok(executed)
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule(&self, lane: Lane, delay: Duration, interval: Option<Duration>, task: Task) -> TaskHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = TaskHandle::new(id);

        let interval_nanos = interval.map(to_nanos);
        if interval_nanos == Some(0) {
            error!("❌ Rejected {} task #{}: repeat interval must be positive", lane, id);
            handle.cancel();
            return handle;
        }

        let due_nanos = self.clock.monotonic_nanos().saturating_add(to_nanos(delay));
        self.queue(lane).lock().push(Reverse(ScheduledTask {
            id,
            due_nanos,
            interval_nanos,
            handle: handle.clone(),
            task,
        }));

        debug!(
            "📝 Scheduled {} task #{} due at {}ns (interval: {:?})",
            lane, id, due_nanos, interval
        );
        handle
    }
}

impl std::fmt::Debug for VirtualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualScheduler")
            .field("monotonic_nanos", &self.clock.monotonic_nanos())
            .field("pending_sync", &self.pending_sync())
            .field("pending_async", &self.pending_async())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use std::sync::Mutex as StdMutex;

    fn counting_task(counter: &Arc<AtomicU64>) -> Task {
        let counter = counter.clone();
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn test_delayed_task_fires_exactly_once_at_due_time() {
        let scheduler = VirtualScheduler::new(0);
        let runs = Arc::new(AtomicU64::new(0));
        scheduler.run_sync_delayed(Duration::from_millis(50), counting_task(&runs));

        assert_eq!(scheduler.run_due_sync().unwrap(), 0);
        scheduler.advance_by(Duration::from_millis(49), true).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        scheduler.advance_by(Duration::from_millis(1), true).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        scheduler.advance_by(Duration::from_millis(100), true).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_sync(), 0);
    }

    #[test]
    fn test_repeating_task_fires_on_cadence_until_cancelled() {
        let scheduler = VirtualScheduler::new(0);
        let fired_at = Arc::new(StdMutex::new(Vec::new()));

        let clock = scheduler.clock();
        let record = fired_at.clone();
        let handle = scheduler.run_sync_repeating(
            Duration::ZERO,
            Duration::from_millis(10),
            Box::new(move || {
                record.lock().unwrap().push(clock.now_epoch_millis());
                Ok(())
            }),
        );

        scheduler.run_due_sync().unwrap();
        scheduler.advance_by(Duration::from_millis(10), true).unwrap();
        assert_eq!(*fired_at.lock().unwrap(), vec![0, 10]);

        handle.cancel();
        scheduler.advance_by(Duration::from_millis(10), true).unwrap();
        scheduler.advance_by(Duration::from_millis(50), true).unwrap();
        assert_eq!(*fired_at.lock().unwrap(), vec![0, 10]);
        assert_eq!(scheduler.pending_sync(), 0);
    }

    #[test]
    fn test_late_drain_catches_up_repeating_task() {
        let scheduler = VirtualScheduler::new(0);
        let runs = Arc::new(AtomicU64::new(0));
        scheduler.run_async_repeating(Duration::from_millis(10), Duration::from_millis(10), counting_task(&runs));

        scheduler.advance_by(Duration::from_millis(35), false).unwrap();
        assert_eq!(scheduler.run_due_async().unwrap(), 3);
        assert_eq!(scheduler.pending_async(), 1);
    }

    #[test]
    fn test_due_order_then_scheduling_order() {
        let scheduler = VirtualScheduler::new(0);
        let order = Arc::new(StdMutex::new(Vec::new()));

        for (label, delay) in [("b", 5), ("a", 1), ("c", 5)] {
            let order = order.clone();
            scheduler.run_sync_delayed(
                Duration::from_millis(delay),
                Box::new(move || {
                    order.lock().unwrap().push(label);
                    Ok(())
                }),
            );
        }

        assert_eq!(scheduler.advance_by(Duration::from_millis(5), true).unwrap(), 3);
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_lanes_drain_independently() {
        let scheduler = VirtualScheduler::new(0);
        let sync_runs = Arc::new(AtomicU64::new(0));
        let async_runs = Arc::new(AtomicU64::new(0));
        scheduler.run_sync(counting_task(&sync_runs));
        scheduler.run_async(counting_task(&async_runs));

        assert_eq!(scheduler.run_due_async().unwrap(), 1);
        assert_eq!(sync_runs.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending_sync(), 1);
    }

    #[test]
    fn test_cancelled_before_drain_never_runs() {
        let scheduler = VirtualScheduler::new(0);
        let runs = Arc::new(AtomicU64::new(0));
        let handle = scheduler.run_sync(counting_task(&runs));
        handle.cancel();

        assert_eq!(scheduler.run_due_sync().unwrap(), 0);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending_sync(), 0);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let scheduler = VirtualScheduler::new(0);
        let runs = Arc::new(AtomicU64::new(0));
        let handle = scheduler.run_sync_repeating(Duration::ZERO, Duration::ZERO, counting_task(&runs));

        assert!(handle.is_cancelled());
        assert_eq!(scheduler.pending_sync(), 0);
    }

    #[test]
    fn test_failed_task_stops_drain_and_is_not_retried() {
        let scheduler = VirtualScheduler::new(0);
        let runs = Arc::new(AtomicU64::new(0));
        let attempts = Arc::new(AtomicU64::new(0));

        let failing_attempts = attempts.clone();
        let failing = scheduler.run_sync_repeating(
            Duration::ZERO,
            Duration::from_millis(10),
            Box::new(move || {
                failing_attempts.fetch_add(1, Ordering::SeqCst);
                Err(TaskError::Failed("boom".to_string()))
            }),
        );
        scheduler.run_sync(counting_task(&runs));

        let err = scheduler.run_due_sync().unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::TaskFailed { lane: Lane::Sync, task_id, .. } if task_id == failing.id()
        ));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending_sync(), 1);

        assert_eq!(scheduler.run_due_sync().unwrap(), 1);
        scheduler.advance_by(Duration::from_millis(100), true).unwrap();
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_sub_millisecond_advances_accumulate() {
        let scheduler = VirtualScheduler::new(0);
        let runs = Arc::new(AtomicU64::new(0));
        scheduler.run_sync_delayed(Duration::from_millis(1), counting_task(&runs));

        scheduler.advance_by(Duration::from_micros(500), true).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        scheduler.advance_by(Duration::from_micros(500), true).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.clock().monotonic_nanos(), 1_000_000);
    }

    #[test]
    fn test_wall_clock_jump_does_not_move_pending_tasks() {
        let scheduler = VirtualScheduler::new(1_000);
        let backwards = Arc::new(AtomicU64::new(0));
        let forwards = Arc::new(AtomicU64::new(0));
        scheduler.run_sync_delayed(Duration::from_millis(50), counting_task(&backwards));

        scheduler.clock().set_epoch_millis(0);
        assert_eq!(scheduler.advance_by(Duration::from_millis(50), true).unwrap(), 1);
        assert_eq!(backwards.load(Ordering::SeqCst), 1);

        scheduler.run_async_delayed(Duration::from_millis(50), counting_task(&forwards));
        scheduler.clock().set_epoch_millis(4_102_444_800_000);
        assert_eq!(scheduler.run_due_async().unwrap(), 0);
        assert_eq!(scheduler.advance_by(Duration::from_millis(50), true).unwrap(), 1);
        assert_eq!(forwards.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_reports_tasks_executed_before_it() {
        let scheduler = VirtualScheduler::new(0);
        let runs = Arc::new(AtomicU64::new(0));
        scheduler.run_sync(counting_task(&runs));
        scheduler.run_sync(counting_task(&runs));
        scheduler.run_sync(Box::new(|| Err(TaskError::Failed("boom".to_string()))));

        let err = scheduler.run_due_sync().unwrap_err();
        assert!(matches!(err, SchedulerError::TaskFailed { executed: 2, .. }));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_scheduling_runs_every_task_once() {
        const THREADS: usize = 4;
        const PER_THREAD: usize = 250;

        let scheduler = VirtualScheduler::new(0);
        let counts: Arc<Vec<AtomicU64>> = Arc::new((0..THREADS * PER_THREAD).map(|_| AtomicU64::new(0)).collect());
        let done = std::sync::atomic::AtomicBool::new(false);

        std::thread::scope(|scope| {
            let drainer = scope.spawn(|| {
                let mut ran = 0;
                while !done.load(Ordering::SeqCst) {
                    ran += scheduler.run_due_sync().unwrap();
                }
                ran + scheduler.run_due_sync().unwrap()
            });

            let producers: Vec<_> = (0..THREADS)
                .map(|t| {
                    let scheduler = &scheduler;
                    let counts = counts.clone();
                    scope.spawn(move || {
                        for i in 0..PER_THREAD {
                            let counts = counts.clone();
                            let slot = t * PER_THREAD + i;
                            scheduler.run_sync(Box::new(move || {
                                counts[slot].fetch_add(1, Ordering::SeqCst);
                                Ok(())
                            }));
                        }
                    })
                })
                .collect();
            for producer in producers {
                producer.join().unwrap();
            }
            done.store(true, Ordering::SeqCst);

            assert_eq!(drainer.join().unwrap(), THREADS * PER_THREAD);
        });

        assert!(counts.iter().all(|count| count.load(Ordering::SeqCst) == 1));
        assert_eq!(scheduler.pending_sync(), 0);
    }

    #[test]
    fn test_task_can_schedule_more_work() {
        let scheduler = Arc::new(VirtualScheduler::new(0));
        let runs = Arc::new(AtomicU64::new(0));

        let inner = Arc::downgrade(&scheduler);
        let counter = runs.clone();
        scheduler.run_sync(Box::new(move || {
            if let Some(scheduler) = inner.upgrade() {
                scheduler.run_sync(counting_task(&counter));
            }
            Ok(())
        }));

        assert_eq!(scheduler.run_due_sync().unwrap(), 2);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
