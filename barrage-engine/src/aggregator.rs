//! Run statistics shared by all workers
//!
//! Counters and the latency sample buffer live behind one lock, so a reader
//! never sees a request counted in one field but not another.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::validator::ValidationError;

/// Result of validating one response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Passed,
    Failed,
}

impl<T> From<&Result<T, ValidationError>> for ValidationOutcome {
    fn from(result: &Result<T, ValidationError>) -> Self {
        match result {
            Ok(_) => ValidationOutcome::Passed,
            Err(_) => ValidationOutcome::Failed,
        }
    }
}

/// Counters plus running latency figures, readable without sorting
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub sent: u64,
    pub completed: u64,
    pub errors: u64,
    pub validation_errors: u64,
    pub min_ms: u64,
    pub max_ms: u64,
    pub avg_ms: f64,
}

impl StatsSnapshot {
    pub fn success(&self) -> u64 {
        self.completed
            .saturating_sub(self.errors)
            .saturating_sub(self.validation_errors)
    }
}

/// Final latency statistics over every measured request
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub samples: usize,
    pub avg_ms: f64,
    pub min_ms: u64,
    pub max_ms: u64,
    pub p50_ms: u64,
    pub p95_ms: u64,
    pub p99_ms: u64,
}

impl LatencyStats {
    /// Compute statistics from unsorted samples; all zero when empty
    pub fn from_samples(mut samples: Vec<u64>) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        samples.sort_unstable();
        let sum: u128 = samples.iter().map(|&s| u128::from(s)).sum();

        Self {
            samples: samples.len(),
            avg_ms: sum as f64 / samples.len() as f64,
            min_ms: samples[0],
            max_ms: samples[samples.len() - 1],
            p50_ms: percentile(&samples, 50.0),
            p95_ms: percentile(&samples, 95.0),
            p99_ms: percentile(&samples, 99.0),
        }
    }
}

/// Nearest-rank percentile over ascending samples
///
/// `index = ceil(p * N / 100) - 1`, clamped to `[0, N - 1]`. Returns 0 for
/// an empty slice.
pub fn percentile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }

    let n = sorted.len();
    let rank = (p * n as f64 / 100.0).ceil() as i64 - 1;
    let index = rank.clamp(0, n as i64 - 1) as usize;
    sorted[index]
}

#[derive(Debug, Default)]
struct AggregatorState {
    sent: u64,
    completed: u64,
    errors: u64,
    validation_errors: u64,
    samples: Vec<u64>,
    latency_sum: u128,
    min_ms: u64,
    max_ms: u64,
}

/// Synchronized accumulator for one run
#[derive(Debug, Default)]
pub struct Aggregator {
    state: Mutex<AggregatorState>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size the sample buffer for an expected number of requests
    pub fn with_capacity(expected_requests: u64) -> Self {
        // Cap the up-front allocation; the buffer still grows on demand
        let capacity = expected_requests.min(1 << 20) as usize;
        Self {
            state: Mutex::new(AggregatorState {
                samples: Vec::with_capacity(capacity),
                ..Default::default()
            }),
        }
    }

    /// A request was dispatched
    pub fn record_sent(&self) {
        self.state.lock().sent += 1;
    }

    /// A request finished without a usable response
    pub fn record_transport_error(&self) {
        let mut state = self.state.lock();
        state.completed += 1;
        state.errors += 1;
    }

    /// A response arrived and was validated
    pub fn record_completed(&self, latency_ms: u64, outcome: ValidationOutcome) {
        let mut state = self.state.lock();
        state.completed += 1;
        if outcome == ValidationOutcome::Failed {
            state.validation_errors += 1;
        }

        if state.samples.is_empty() {
            state.min_ms = latency_ms;
            state.max_ms = latency_ms;
        } else {
            state.min_ms = state.min_ms.min(latency_ms);
            state.max_ms = state.max_ms.max(latency_ms);
        }
        state.latency_sum += u128::from(latency_ms);
        state.samples.push(latency_ms);
    }

    /// Consistent view of the counters
    pub fn snapshot(&self) -> StatsSnapshot {
        let state = self.state.lock();
        let avg_ms = if state.samples.is_empty() {
            0.0
        } else {
            state.latency_sum as f64 / state.samples.len() as f64
        };

        StatsSnapshot {
            sent: state.sent,
            completed: state.completed,
            errors: state.errors,
            validation_errors: state.validation_errors,
            min_ms: state.min_ms,
            max_ms: state.max_ms,
            avg_ms,
        }
    }

    /// Counters plus full latency statistics
    ///
    /// The samples are copied out under the lock and sorted after it is released.
    pub fn finalize(&self) -> (StatsSnapshot, LatencyStats) {
        let (snapshot, samples) = {
            let state = self.state.lock();
            (
                StatsSnapshot {
                    sent: state.sent,
                    completed: state.completed,
                    errors: state.errors,
                    validation_errors: state.validation_errors,
                    min_ms: state.min_ms,
                    max_ms: state.max_ms,
                    avg_ms: 0.0,
                },
                state.samples.clone(),
            )
        };

        let latency = LatencyStats::from_samples(samples);
        (
            StatsSnapshot {
                avg_ms: latency.avg_ms,
                ..snapshot
            },
            latency,
        )
    }
}
