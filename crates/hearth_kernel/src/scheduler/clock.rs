use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Source of time for the kernel.
pub trait Clock: Send + Sync {
    /// Wall-clock time in milliseconds since the Unix epoch.
    fn now_epoch_millis(&self) -> u64;

    /// Monotonic time in nanoseconds from an arbitrary origin.
    fn monotonic_nanos(&self) -> u64;
}

/// Clock that only moves when told to.
///
/// [`advance_by`](DeterministicClock::advance_by) moves both channels together.
/// [`set_epoch_millis`](DeterministicClock::set_epoch_millis) jumps the wall
/// clock alone, the way a system clock adjustment would.
#[derive(Debug, Default)]
pub struct DeterministicClock {
    // Kept in nanos so sub-millisecond advances accumulate on the wall channel too
    epoch_nanos: AtomicU64,
    monotonic_nanos: AtomicU64,
}

const NANOS_PER_MILLI: u64 = 1_000_000;

impl DeterministicClock {
    pub fn new(start_epoch_millis: u64) -> Self {
        Self {
            epoch_nanos: AtomicU64::new(start_epoch_millis.saturating_mul(NANOS_PER_MILLI)),
            monotonic_nanos: AtomicU64::new(0),
        }
    }

    pub fn advance_by(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.epoch_nanos.fetch_add(nanos, Ordering::AcqRel);
        self.monotonic_nanos.fetch_add(nanos, Ordering::AcqRel);
    }

    pub fn set_epoch_millis(&self, epoch_millis: u64) {
        self.epoch_nanos
            .store(epoch_millis.saturating_mul(NANOS_PER_MILLI), Ordering::Release);
    }
}

impl Clock for DeterministicClock {
    fn now_epoch_millis(&self) -> u64 {
        self.epoch_nanos.load(Ordering::Acquire) / NANOS_PER_MILLI
    }

    fn monotonic_nanos(&self) -> u64 {
        self.monotonic_nanos.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_moves_both_channels() {
        let clock = DeterministicClock::new(1_000);
        clock.advance_by(Duration::from_millis(250));

        assert_eq!(clock.now_epoch_millis(), 1_250);
        assert_eq!(clock.monotonic_nanos(), 250_000_000);
    }

    #[test]
    fn test_set_epoch_leaves_monotonic_alone() {
        let clock = DeterministicClock::new(0);
        clock.advance_by(Duration::from_millis(5));
        clock.set_epoch_millis(42);

        assert_eq!(clock.now_epoch_millis(), 42);
        assert_eq!(clock.monotonic_nanos(), 5_000_000);
    }

    #[test]
    fn test_sub_millisecond_advances_carry_on_both_channels() {
        let clock = DeterministicClock::new(0);
        clock.advance_by(Duration::from_micros(600));
        assert_eq!(clock.now_epoch_millis(), 0);

        clock.advance_by(Duration::from_micros(600));
        assert_eq!(clock.now_epoch_millis(), 1);
        assert_eq!(clock.monotonic_nanos(), 1_200_000);
    }
}
