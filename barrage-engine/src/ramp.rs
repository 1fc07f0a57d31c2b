//! Worker start schedule
//!
//! Linear ramp: worker `k` of `N` starts `k * R / N` after the run starts,
//! so worker 0 starts immediately and full concurrency is reached at
//! `R * (N - 1) / N`. With `R == 0` every worker starts at once.

use std::time::Duration;

/// Deterministic start offsets for a run's workers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampSchedule {
    workers: u32,
    ramp_up: Duration,
}

impl RampSchedule {
    pub fn new(workers: u32, ramp_up: Duration) -> Self {
        Self { workers, ramp_up }
    }

    pub fn workers(&self) -> u32 {
        self.workers
    }

    /// Delay before worker `k` may start
    pub fn start_offset(&self, worker: u32) -> Duration {
        if self.workers == 0 || self.ramp_up.is_zero() {
            return Duration::ZERO;
        }

        let k = u128::from(worker.min(self.workers - 1));
        let nanos = self.ramp_up.as_nanos() * k / u128::from(self.workers);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Offsets of every worker, in start order
    pub fn offsets(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.workers).map(|k| self.start_offset(k))
    }

    /// When the last worker starts
    pub fn full_concurrency_at(&self) -> Duration {
        self.start_offset(self.workers.saturating_sub(1))
    }

    /// Number of workers scheduled to have started after `elapsed`
    pub fn scheduled_at(&self, elapsed: Duration) -> u32 {
        if self.ramp_up.is_zero() {
            return self.workers;
        }
        let started = elapsed.as_nanos() * u128::from(self.workers) / self.ramp_up.as_nanos() + 1;
        started.min(u128::from(self.workers)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_linear_ramp_offsets() {
        let schedule = RampSchedule::new(4, secs(8));
        let offsets: Vec<_> = schedule.offsets().collect();
        assert_eq!(offsets, vec![secs(0), secs(2), secs(4), secs(6)]);
        assert_eq!(schedule.full_concurrency_at(), secs(6));
    }

    #[test]
    fn test_zero_ramp_starts_everyone_immediately() {
        let schedule = RampSchedule::new(50, Duration::ZERO);
        assert!(schedule.offsets().all(|o| o.is_zero()));
        assert_eq!(schedule.scheduled_at(Duration::ZERO), 50);
    }

    #[test]
    fn test_uneven_division_keeps_precision() {
        let schedule = RampSchedule::new(3, secs(1));
        assert_eq!(schedule.start_offset(1), Duration::from_nanos(333_333_333));
        assert_eq!(schedule.start_offset(2), Duration::from_nanos(666_666_666));
        assert!(schedule.full_concurrency_at() < secs(1));
    }

    #[test]
    fn test_single_worker() {
        let schedule = RampSchedule::new(1, secs(10));
        assert_eq!(schedule.offsets().collect::<Vec<_>>(), vec![Duration::ZERO]);
        assert_eq!(schedule.scheduled_at(Duration::ZERO), 1);
    }

    #[test]
    fn test_scheduled_at() {
        let schedule = RampSchedule::new(4, secs(8));
        assert_eq!(schedule.scheduled_at(Duration::ZERO), 1);
        assert_eq!(schedule.scheduled_at(Duration::from_millis(1999)), 1);
        assert_eq!(schedule.scheduled_at(secs(2)), 2);
        assert_eq!(schedule.scheduled_at(secs(6)), 4);
        assert_eq!(schedule.scheduled_at(secs(60)), 4);
    }

    #[test]
    fn test_offsets_are_monotonic() {
        let schedule = RampSchedule::new(1000, secs(7));
        let offsets: Vec<_> = schedule.offsets().collect();
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
        assert!(*offsets.last().unwrap() < secs(7));
    }
}
