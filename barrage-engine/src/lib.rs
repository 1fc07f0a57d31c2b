//! barrage stress-test execution engine
//!
//! Drives a configurable number of concurrent workers against one resolved
//! HTTP request, ramps concurrency up over time, bounds the run by request
//! count and wall-clock duration, validates every response and aggregates
//! the outcome into latency percentiles.
//!
//! The [`Executor`] is the entry point:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use barrage_engine::{Executor, StressTestConfig};
//! # use barrage_http::{HttpManager, HttpMethod, ResolvedRequest};
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = Executor::new(Arc::new(HttpManager::new()?));
//! let config = StressTestConfig::new(10, 1_000);
//! executor.start(&config, ResolvedRequest::new(HttpMethod::Get, "http://localhost:8080/"))?;
//!
//! let progress = executor.snapshot();
//! println!("{} of {} sent", progress.sent, config.total_requests);
//!
//! let run = executor.wait().await?;
//! println!("p99 = {} ms", run.p99_duration_ms);
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod budget;
pub mod error;
pub mod executor;
pub mod model;
pub mod ramp;
pub mod validator;
mod worker;

// Re-export main types
pub use aggregator::{percentile, Aggregator, LatencyStats, StatsSnapshot, ValidationOutcome};
pub use budget::RequestBudget;
pub use error::{EngineError, EngineResult};
pub use executor::{Executor, ExecutorState, ProgressView};
pub use model::{Expectations, Run, RunStatus, StressTestConfig};
pub use ramp::RampSchedule;
pub use validator::{validate, BodyCheck, CompiledExpectations, FieldPath, ValidationError};
