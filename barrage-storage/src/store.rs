//! The store interface

use async_trait::async_trait;
use barrage_engine::{Run, StressTestConfig};
use uuid::Uuid;

use crate::error::StoreResult;

/// Persistence for configs and finished runs
///
/// Config names are unique within a profile. Only runs in a terminal status
/// can be saved.
#[async_trait]
pub trait StressTestStore: Send + Sync {
    /// Insert or update a config; returns it with its id assigned
    async fn save_config(&self, config: StressTestConfig) -> StoreResult<StressTestConfig>;

    /// Configs of a profile, ordered by name
    async fn list_configs(&self, profile: &str) -> StoreResult<Vec<StressTestConfig>>;

    async fn get_config(&self, id: i64) -> StoreResult<StressTestConfig>;

    async fn get_config_by_name(&self, profile: &str, name: &str) -> StoreResult<StressTestConfig>;

    async fn delete_config(&self, id: i64) -> StoreResult<()>;

    async fn save_run(&self, run: Run) -> StoreResult<()>;

    /// Runs of a profile, newest first; `limit == 0` returns all of them
    async fn list_runs(&self, profile: &str, limit: usize) -> StoreResult<Vec<Run>>;

    async fn get_run(&self, id: Uuid) -> StoreResult<Run>;

    async fn delete_run(&self, id: Uuid) -> StoreResult<()>;
}
