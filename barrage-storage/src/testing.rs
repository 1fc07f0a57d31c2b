//! Mock store for testing code that persists through [`StressTestStore`]

use async_trait::async_trait;
use barrage_engine::{Run, RunStatus, StressTestConfig};
use mockall::mock;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::store::StressTestStore;

mock! {
    pub Store {}

    #[async_trait]
    impl StressTestStore for Store {
        async fn save_config(&self, config: StressTestConfig) -> StoreResult<StressTestConfig>;
        async fn list_configs(&self, profile: &str) -> StoreResult<Vec<StressTestConfig>>;
        async fn get_config(&self, id: i64) -> StoreResult<StressTestConfig>;
        async fn get_config_by_name(&self, profile: &str, name: &str) -> StoreResult<StressTestConfig>;
        async fn delete_config(&self, id: i64) -> StoreResult<()>;
        async fn save_run(&self, run: Run) -> StoreResult<()>;
        async fn list_runs(&self, profile: &str, limit: usize) -> StoreResult<Vec<Run>>;
        async fn get_run(&self, id: Uuid) -> StoreResult<Run>;
        async fn delete_run(&self, id: Uuid) -> StoreResult<()>;
    }
}

/// A saved config fixture
pub fn saved_config(id: i64, name: &str) -> StressTestConfig {
    let mut config = StressTestConfig::new(4, 200)
        .with_name(name)
        .with_request_file("requests/health.yaml");
    config.id = Some(id);
    config
}

/// A finished run fixture for `config`
pub fn finished_run(config: &StressTestConfig, status: RunStatus) -> Run {
    let mut run = Run::start(config);
    run.status = status;
    run.completed_at = Some(run.started_at);
    run
}
