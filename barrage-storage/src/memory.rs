//! In-memory store

use async_trait::async_trait;
use barrage_engine::{Run, StressTestConfig};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::StoreResult;
use crate::store::StressTestStore;

/// Store that lives as long as the process
#[derive(Debug, Default)]
pub struct InMemoryStore {
    catalog: RwLock<Catalog>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `max_runs_per_profile` runs per profile
    pub fn with_retention(max_runs_per_profile: usize) -> Self {
        Self {
            catalog: RwLock::new(Catalog::new(max_runs_per_profile)),
        }
    }
}

#[async_trait]
impl StressTestStore for InMemoryStore {
    async fn save_config(&self, config: StressTestConfig) -> StoreResult<StressTestConfig> {
        self.catalog.write().await.save_config(config)
    }

    async fn list_configs(&self, profile: &str) -> StoreResult<Vec<StressTestConfig>> {
        Ok(self.catalog.read().await.list_configs(profile))
    }

    async fn get_config(&self, id: i64) -> StoreResult<StressTestConfig> {
        self.catalog.read().await.get_config(id)
    }

    async fn get_config_by_name(&self, profile: &str, name: &str) -> StoreResult<StressTestConfig> {
        self.catalog.read().await.get_config_by_name(profile, name)
    }

    async fn delete_config(&self, id: i64) -> StoreResult<()> {
        self.catalog.write().await.delete_config(id)
    }

    async fn save_run(&self, run: Run) -> StoreResult<()> {
        self.catalog.write().await.save_run(run)
    }

    async fn list_runs(&self, profile: &str, limit: usize) -> StoreResult<Vec<Run>> {
        Ok(self.catalog.read().await.list_runs(profile, limit))
    }

    async fn get_run(&self, id: Uuid) -> StoreResult<Run> {
        self.catalog.read().await.get_run(id)
    }

    async fn delete_run(&self, id: Uuid) -> StoreResult<()> {
        self.catalog.write().await.delete_run(id)
    }
}
