//! Worker loop
//!
//! Every worker repeatedly claims a unit from the shared budget, sends the
//! request and records the outcome, until the budget is spent, the deadline
//! passes or the run is stopped.

use barrage_http::{RequestExecutor, ResolvedRequest};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::aggregator::{Aggregator, ValidationOutcome};
use crate::budget::RequestBudget;
use crate::validator::CompiledExpectations;

/// Why a worker left its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerExit {
    BudgetExhausted,
    DeadlineReached,
    Stopped,
}

/// State shared by every worker of one run
pub(crate) struct WorkerContext {
    pub executor: Arc<dyn RequestExecutor>,
    pub request: ResolvedRequest,
    pub expectations: CompiledExpectations,
    pub aggregator: Arc<Aggregator>,
    pub budget: RequestBudget,
    /// Raised by `Stop()`; aborts in-flight requests
    pub stop: CancellationToken,
    /// Child of `stop`, also raised once the budget is spent; wakes ramp sleepers
    pub halt: CancellationToken,
    /// Ramp offsets and the deadline are measured from here
    pub started: Instant,
    pub deadline: Option<Instant>,
    /// Ceiling for a single request, whatever the executor does
    pub request_timeout: Duration,
    pub active_workers: Arc<AtomicUsize>,
}

impl WorkerContext {
    async fn until_deadline(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Decrements the active worker count however the worker ends
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(Arc::clone(counter))
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

pub(crate) async fn run_worker(
    id: u32,
    start_delay: Duration,
    ctx: Arc<WorkerContext>,
) -> WorkerExit {
    if !start_delay.is_zero() {
        tokio::select! {
            _ = ctx.halt.cancelled() => {
                trace!(worker = id, "Worker halted before its ramp slot");
                return if ctx.stop.is_cancelled() {
                    WorkerExit::Stopped
                } else {
                    WorkerExit::BudgetExhausted
                };
            }
            _ = ctx.until_deadline() => return WorkerExit::DeadlineReached,
            _ = tokio::time::sleep_until(ctx.started + start_delay) => {}
        }
    }

    let _active = ActiveGuard::enter(&ctx.active_workers);
    debug!(worker = id, delay_ms = start_delay.as_millis() as u64, "Worker started");

    let exit = loop {
        if ctx.stop.is_cancelled() {
            break WorkerExit::Stopped;
        }
        if ctx.deadline_passed() {
            break WorkerExit::DeadlineReached;
        }
        if !ctx.budget.try_claim() {
            // Nobody still waiting for a ramp slot can do anything useful
            ctx.halt.cancel();
            break WorkerExit::BudgetExhausted;
        }

        ctx.aggregator.record_sent();
        let started = Instant::now();

        let request = tokio::time::timeout(ctx.request_timeout, ctx.executor.execute(&ctx.request));
        // A response that is already in is recorded even if stop or the deadline fired too
        let result = tokio::select! {
            biased;
            result = request => result,
            _ = ctx.stop.cancelled() => {
                trace!(worker = id, "In-flight request aborted by stop");
                break WorkerExit::Stopped;
            }
            _ = ctx.until_deadline() => {
                trace!(worker = id, "In-flight request aborted at deadline");
                break WorkerExit::DeadlineReached;
            }
        };

        match result {
            Ok(Ok(response)) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                let validation = ctx.expectations.validate(response.status, &response.body);
                if let Err(ref e) = validation {
                    trace!(worker = id, status = response.status, "Validation failed: {}", e);
                }
                ctx.aggregator
                    .record_completed(latency_ms, ValidationOutcome::from(&validation));
            }
            Ok(Err(e)) => {
                trace!(worker = id, "Transport error: {}", e);
                ctx.aggregator.record_transport_error();
            }
            Err(_) => {
                trace!(
                    worker = id,
                    timeout_ms = ctx.request_timeout.as_millis() as u64,
                    "Request timed out"
                );
                ctx.aggregator.record_transport_error();
            }
        }
    };

    debug!(worker = id, exit = ?exit, "Worker finished");
    exit
}
