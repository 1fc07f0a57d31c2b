//! Saved config -> request file -> run -> stored history

mod common;

use anyhow::Result;
use barrage_config::{ConfigLoader, StorageConfig};
use barrage_engine::{Executor, Expectations, Run, RunStatus, StressTestConfig};
use barrage_http::{load_request_file, HttpManager};
use barrage_storage::{JsonFileStore, StressTestStore};
use common::TargetServer;
use std::sync::Arc;

async fn run_saved_config(store: &dyn StressTestStore, name: &str) -> Result<Run> {
    let config = store.get_config_by_name("default", name).await?;
    let request = load_request_file(&config.request_file)?;

    let executor = Executor::new(Arc::new(HttpManager::new()?));
    executor.start(&config, request)?;
    let run = executor.wait().await?;
    store.save_run(run.clone()).await?;
    Ok(run)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_saved_config_runs_and_history_survives_reopen() -> Result<()> {
    let server = TargetServer::start().await?;
    let dir = tempfile::tempdir()?;

    let request_path = dir.path().join("health.yaml");
    std::fs::write(
        &request_path,
        format!(
            "method: GET\nurl: {}\nheaders:\n  Accept: application/json\n",
            server.url("/health")
        ),
    )?;

    let storage = StorageConfig {
        data_dir: Some(dir.path().join("data")),
        ..Default::default()
    };
    let store = JsonFileStore::from_config(&storage, dir.path()).await?;

    let config = StressTestConfig::new(3, 30)
        .with_name("health")
        .with_request_file(request_path.to_string_lossy())
        .with_expectations(Expectations {
            expected_status_codes: [200].into_iter().collect(),
            expected_body_contains: Some("\"status\":\"ok\"".to_string()),
            ..Default::default()
        });
    let saved = store.save_config(config).await?;

    let first = run_saved_config(&store, "health").await?;
    let second = run_saved_config(&store, "health").await?;
    assert_eq!(first.status, RunStatus::Completed);
    assert_eq!(first.success(), 30);
    assert_eq!(first.config_id, saved.id);
    assert_eq!(server.hits(), 60);

    let reopened = JsonFileStore::from_config(&storage, dir.path()).await?;
    assert_eq!(reopened.path(), store.path());

    let history = reopened.list_runs("default", 0).await?;
    let ids: Vec<_> = history.iter().map(|r| r.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&first.id) && ids.contains(&second.id));

    let stored = reopened.get_run(first.id).await?;
    assert_eq!(stored.total_requests_completed, 30);
    assert_eq!(stored.p99_duration_ms, first.p99_duration_ms);
    Ok(())
}

#[tokio::test]
async fn test_storage_settings_from_config_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config_path = dir.path().join("barrage.yaml");
    std::fs::write(
        &config_path,
        format!(
            "storage:\n  data_dir: {}\n  max_runs_per_profile: 1\n",
            dir.path().join("store").display()
        ),
    )?;

    let config = ConfigLoader::new().from_file(&config_path)?;
    let store = JsonFileStore::from_config(&config.storage, dir.path()).await?;
    assert!(store.path().starts_with(dir.path().join("store")));

    let test = StressTestConfig::new(1, 1).with_request_file("unused.yaml");
    for _ in 0..3 {
        store
            .save_run(Run::preflight_failure(&test, "request file missing"))
            .await?;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(store.list_runs("default", 0).await?.len(), 1);
    Ok(())
}
