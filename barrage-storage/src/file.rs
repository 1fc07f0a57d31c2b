//! JSON file store
//!
//! The whole catalog lives in one JSON document. Every change rewrites it to
//! a sibling temp file which is then renamed over the original, so a crash
//! never leaves a half-written store behind.

use async_trait::async_trait;
use barrage_config::StorageConfig;
use barrage_engine::{Run, StressTestConfig};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::StoreResult;
use crate::store::StressTestStore;

/// Store backed by a single JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    catalog: Mutex<Catalog>,
}

impl JsonFileStore {
    /// Open the store at `path`, creating parent directories as needed
    ///
    /// A missing file is an empty store; it is created on the first change.
    pub async fn open(path: impl Into<PathBuf>, max_runs_per_profile: usize) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut catalog = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Catalog>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Catalog::default(),
            Err(e) => return Err(e.into()),
        };
        catalog.set_retention(max_runs_per_profile);

        info!("Opened stress-test store at {}", path.display());
        Ok(Self {
            path,
            catalog: Mutex::new(catalog),
        })
    }

    /// Open the store described by the storage configuration
    ///
    /// `fallback_dir` is used when the configuration names no data directory.
    pub async fn from_config(config: &StorageConfig, fallback_dir: &Path) -> StoreResult<Self> {
        let path = config
            .store_path()
            .unwrap_or_else(|| fallback_dir.join(&config.file_name));
        Self::open(path, config.max_runs_per_profile).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, catalog: &Catalog) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(catalog)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Persisted store to {}", self.path.display());
        Ok(())
    }

    /// Apply a change and write the catalog back; nothing is kept if the write fails
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Catalog) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut catalog = self.catalog.lock().await;
        let mut updated = catalog.clone();
        let result = change(&mut updated)?;
        self.persist(&updated).await?;
        *catalog = updated;
        Ok(result)
    }
}

#[async_trait]
impl StressTestStore for JsonFileStore {
    async fn save_config(&self, config: StressTestConfig) -> StoreResult<StressTestConfig> {
        self.mutate(|catalog| catalog.save_config(config)).await
    }

    async fn list_configs(&self, profile: &str) -> StoreResult<Vec<StressTestConfig>> {
        Ok(self.catalog.lock().await.list_configs(profile))
    }

    async fn get_config(&self, id: i64) -> StoreResult<StressTestConfig> {
        self.catalog.lock().await.get_config(id)
    }

    async fn get_config_by_name(&self, profile: &str, name: &str) -> StoreResult<StressTestConfig> {
        self.catalog.lock().await.get_config_by_name(profile, name)
    }

    async fn delete_config(&self, id: i64) -> StoreResult<()> {
        self.mutate(|catalog| catalog.delete_config(id)).await
    }

    async fn save_run(&self, run: Run) -> StoreResult<()> {
        self.mutate(|catalog| catalog.save_run(run)).await
    }

    async fn list_runs(&self, profile: &str, limit: usize) -> StoreResult<Vec<Run>> {
        Ok(self.catalog.lock().await.list_runs(profile, limit))
    }

    async fn get_run(&self, id: Uuid) -> StoreResult<Run> {
        self.catalog.lock().await.get_run(id)
    }

    async fn delete_run(&self, id: Uuid) -> StoreResult<()> {
        self.mutate(|catalog| catalog.delete_run(id)).await
    }
}
