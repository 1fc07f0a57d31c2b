//! Shared request budget

use std::sync::atomic::{AtomicU64, Ordering};

/// Counts down the requests a run may still dispatch
///
/// Claims never exceed the total, however many workers race for the last unit.
#[derive(Debug)]
pub struct RequestBudget {
    total: u64,
    claimed: AtomicU64,
}

impl RequestBudget {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            claimed: AtomicU64::new(0),
        }
    }

    /// Take one unit; false once the budget is spent
    pub fn try_claim(&self) -> bool {
        self.claimed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |claimed| {
                (claimed < self.total).then_some(claimed + 1)
            })
            .is_ok()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

}
