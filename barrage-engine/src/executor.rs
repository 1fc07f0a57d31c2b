//! Run lifecycle
//!
//! An [`Executor`] drives exactly one run: `idle -> running -> {completed,
//! failed, cancelled}`. [`Executor::start`] returns as soon as the workers are
//! spawned, [`Executor::snapshot`] can be polled at any time and
//! [`Executor::wait`] finalizes the run once every worker has exited.

use barrage_config::{ConfigError, ExecutionConfig, Validatable};
use barrage_http::{RequestExecutor, ResolvedRequest};
use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::aggregator::Aggregator;
use crate::budget::RequestBudget;
use crate::error::{EngineError, EngineResult};
use crate::model::{Run, RunStatus, StressTestConfig};
use crate::ramp::RampSchedule;
use crate::worker::{run_worker, WorkerContext};

/// Observable executor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorState {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ExecutorState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutorState::Completed | ExecutorState::Failed | ExecutorState::Cancelled
        )
    }
}

impl From<RunStatus> for ExecutorState {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Running => ExecutorState::Running,
            RunStatus::Completed => ExecutorState::Completed,
            RunStatus::Failed => ExecutorState::Failed,
            RunStatus::Cancelled => ExecutorState::Cancelled,
        }
    }
}

impl fmt::Display for ExecutorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutorState::Idle => "idle",
            ExecutorState::Running => "running",
            ExecutorState::Completed => "completed",
            ExecutorState::Failed => "failed",
            ExecutorState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Live progress of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressView {
    pub state: ExecutorState,
    /// Request budget of the run
    pub total_requests: u64,
    pub sent: u64,
    pub completed: u64,
    pub success: u64,
    pub errors: u64,
    pub validation_errors: u64,
    pub elapsed_ms: u64,
    pub min_ms: u64,
    pub max_ms: u64,
    pub avg_ms: f64,
    /// Workers past their ramp slot and still looping
    pub active_workers: usize,
    /// Workers whose ramp slot has come up by now
    pub scheduled_workers: u32,
    /// Target concurrency of the run
    pub workers: u32,
    pub requests_per_second: f64,
    /// Every worker has exited; `wait()` returns without blocking
    pub finished: bool,
}

impl ProgressView {
    fn idle() -> Self {
        Self {
            state: ExecutorState::Idle,
            total_requests: 0,
            sent: 0,
            completed: 0,
            success: 0,
            errors: 0,
            validation_errors: 0,
            elapsed_ms: 0,
            min_ms: 0,
            max_ms: 0,
            avg_ms: 0.0,
            active_workers: 0,
            scheduled_workers: 0,
            workers: 0,
            requests_per_second: 0.0,
            finished: false,
        }
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}

fn throughput(completed: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        completed as f64 / secs
    } else {
        0.0
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Bookkeeping written by the spawned worker tasks
struct Lifecycle {
    remaining: AtomicUsize,
    finished_at: Mutex<Option<Instant>>,
    fatal: Mutex<Option<String>>,
}

impl Lifecycle {
    fn new(workers: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(workers),
            finished_at: Mutex::new(None),
            fatal: Mutex::new(None),
        }
    }

    fn worker_exited(&self) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            *self.finished_at.lock() = Some(Instant::now());
        }
    }

    fn worker_panicked(&self, worker: u32, message: String) {
        error!(worker, "Worker panicked: {}", message);
        self.fatal
            .lock()
            .get_or_insert_with(|| format!("worker {} panicked: {}", worker, message));
    }

    fn is_finished(&self) -> bool {
        self.remaining.load(Ordering::Acquire) == 0
    }
}

/// One started run
struct ActiveRun {
    template: Run,
    schedule: RampSchedule,
    ctx: Arc<WorkerContext>,
    lifecycle: Arc<Lifecycle>,
    tracker: TaskTracker,
    started: Instant,
    stop_requested: AtomicBool,
    outcome: OnceCell<Run>,
}

impl ActiveRun {
    fn elapsed(&self) -> Duration {
        match *self.lifecycle.finished_at.lock() {
            Some(finished) => finished.duration_since(self.started),
            None => self.started.elapsed(),
        }
    }

    fn state(&self) -> ExecutorState {
        self.outcome
            .get()
            .map(|run| run.status.into())
            .unwrap_or(ExecutorState::Running)
    }

    async fn finalize(&self) -> Run {
        self.tracker.wait().await;

        let (counts, latency) = self.ctx.aggregator.finalize();
        let elapsed = self.elapsed();

        let mut run = self.template.clone();
        let wall_clock = chrono::Duration::from_std(elapsed).unwrap_or(chrono::Duration::zero());
        run.completed_at = Some(run.started_at + wall_clock);
        run.total_requests_sent = counts.sent;
        run.total_requests_completed = counts.completed;
        run.total_errors = counts.errors;
        run.total_validation_errors = counts.validation_errors;
        run.apply_latency(&latency);
        run.requests_per_second = throughput(counts.completed, elapsed);

        let fatal = self.lifecycle.fatal.lock().clone();
        run.status = if let Some(message) = fatal {
            run.error_message = Some(message);
            RunStatus::Failed
        } else if self.stop_requested.load(Ordering::Acquire) {
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };

        info!(
            run_id = %run.id,
            status = %run.status,
            sent = run.total_requests_sent,
            completed = run.total_requests_completed,
            errors = run.total_errors,
            validation_errors = run.total_validation_errors,
            p50_ms = run.p50_duration_ms,
            p99_ms = run.p99_duration_ms,
            elapsed_ms = elapsed.as_millis() as u64,
            "Stress test finished"
        );

        run
    }
}

/// Runs one stress test against a request executor
///
/// Cloning yields another handle to the same run, so a UI can poll
/// [`snapshot`](Executor::snapshot) from one task and [`wait`](Executor::wait)
/// from another.
#[derive(Clone)]
pub struct Executor {
    client: Arc<dyn RequestExecutor>,
    settings: ExecutionConfig,
    slot: Arc<Mutex<Option<Arc<ActiveRun>>>>,
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("settings", &self.settings)
            .field("state", &self.state())
            .finish()
    }
}

impl Executor {
    /// Create an executor with default execution settings
    pub fn new(client: Arc<dyn RequestExecutor>) -> Self {
        Self::with_settings(client, ExecutionConfig::default())
    }

    pub fn with_settings(client: Arc<dyn RequestExecutor>, settings: ExecutionConfig) -> Self {
        Self {
            client,
            settings,
            slot: Arc::new(Mutex::new(None)),
        }
    }

    fn current(&self) -> Option<Arc<ActiveRun>> {
        self.slot.lock().clone()
    }

    /// Validate `config` and launch the workers
    ///
    /// Returns the id of the new run without waiting for any request. A
    /// configuration problem is reported here and leaves the executor idle.
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, config: &StressTestConfig, request: ResolvedRequest) -> EngineResult<Uuid> {
        let mut slot = self.slot.lock();
        if let Some(active) = slot.as_ref() {
            return Err(EngineError::InvalidState(format!(
                "executor already started run {}",
                active.template.id
            )));
        }

        let expectations = config.prepare()?;
        if config.concurrent_conns > self.settings.max_concurrent_conns {
            return Err(ConfigError::domain(
                config.domain_name(),
                format!(
                    "concurrent_conns {} exceeds the configured maximum of {}",
                    config.concurrent_conns, self.settings.max_concurrent_conns
                ),
            )
            .into());
        }
        request.validate()?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            EngineError::InvalidState("start must be called within a Tokio runtime".to_string())
        })?;

        let template = Run::start(config);
        let started = Instant::now();
        let stop = CancellationToken::new();
        let ctx = Arc::new(WorkerContext {
            executor: Arc::clone(&self.client),
            request,
            expectations,
            aggregator: Arc::new(Aggregator::with_capacity(config.total_requests)),
            budget: RequestBudget::new(config.total_requests),
            halt: stop.child_token(),
            stop,
            started,
            deadline: config.test_duration().map(|d| started + d),
            request_timeout: self.settings.max_request_timeout,
            active_workers: Arc::new(AtomicUsize::new(0)),
        });

        let schedule = RampSchedule::new(config.concurrent_conns, config.ramp_up());
        let lifecycle = Arc::new(Lifecycle::new(schedule.workers() as usize));
        let tracker = TaskTracker::new();

        for (worker, delay) in (0..).zip(schedule.offsets()) {
            let ctx = Arc::clone(&ctx);
            let lifecycle = Arc::clone(&lifecycle);
            tracker.spawn_on(
                async move {
                    let result = AssertUnwindSafe(run_worker(worker, delay, ctx))
                        .catch_unwind()
                        .await;
                    if let Err(panic) = result {
                        lifecycle.worker_panicked(worker, panic_message(panic.as_ref()));
                    }
                    lifecycle.worker_exited();
                },
                &runtime,
            );
        }
        tracker.close();

        info!(
            run_id = %template.id,
            config = %config.name,
            url = %ctx.request.url,
            concurrent_conns = config.concurrent_conns,
            total_requests = config.total_requests,
            ramp_up_sec = config.ramp_up_duration_sec,
            full_concurrency_ms = schedule.full_concurrency_at().as_millis() as u64,
            duration_sec = config.test_duration_sec,
            "Stress test started"
        );

        let run_id = template.id;
        *slot = Some(Arc::new(ActiveRun {
            template,
            schedule,
            ctx,
            lifecycle,
            tracker,
            started,
            stop_requested: AtomicBool::new(false),
            outcome: OnceCell::new(),
        }));

        Ok(run_id)
    }

    /// Ask every worker to stop
    ///
    /// Idempotent and non-blocking. Calling it after the workers have finished
    /// leaves the run `completed`.
    pub fn stop(&self) {
        let Some(active) = self.current() else {
            debug!("Stop called before any run was started");
            return;
        };

        if !active.lifecycle.is_finished() && !active.stop_requested.swap(true, Ordering::AcqRel) {
            info!(run_id = %active.template.id, "Stop requested");
        }
        active.ctx.stop.cancel();
    }

    /// Wait for every worker to exit and return the finalized run
    ///
    /// The run is finalized once; later calls return the same record.
    pub async fn wait(&self) -> EngineResult<Run> {
        let active = self
            .current()
            .ok_or_else(|| EngineError::InvalidState("no run has been started".to_string()))?;

        let run = active.outcome.get_or_init(|| active.finalize()).await;
        Ok(run.clone())
    }

    /// Current counters; never blocks on worker activity
    pub fn snapshot(&self) -> ProgressView {
        let Some(active) = self.current() else {
            return ProgressView::idle();
        };

        let counts = active.ctx.aggregator.snapshot();
        let elapsed = active.elapsed();

        ProgressView {
            state: active.state(),
            total_requests: active.ctx.budget.total(),
            sent: counts.sent,
            completed: counts.completed,
            success: counts.success(),
            errors: counts.errors,
            validation_errors: counts.validation_errors,
            elapsed_ms: elapsed.as_millis() as u64,
            min_ms: counts.min_ms,
            max_ms: counts.max_ms,
            avg_ms: counts.avg_ms,
            active_workers: active.ctx.active_workers.load(Ordering::Acquire),
            scheduled_workers: active.schedule.scheduled_at(elapsed),
            workers: active.schedule.workers(),
            requests_per_second: throughput(counts.completed, elapsed),
            finished: active.lifecycle.is_finished(),
        }
    }

    pub fn state(&self) -> ExecutorState {
        self.current()
            .map(|active| active.state())
            .unwrap_or(ExecutorState::Idle)
    }
}
