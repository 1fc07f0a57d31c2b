use barrage_config::StorageConfig;
use barrage_engine::{Run, RunStatus, StressTestConfig};
use barrage_storage::{JsonFileStore, StoreError, StressTestStore};
use tempfile::TempDir;

fn finished(config: &StressTestConfig) -> Run {
    let mut run = Run::start(config);
    run.status = RunStatus::Completed;
    run.total_requests_sent = 10;
    run.total_requests_completed = 10;
    run.completed_at = Some(run.started_at);
    run
}

#[tokio::test]
async fn test_file_store_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("store.json");

    let config_id;
    let run_id;
    {
        let store = JsonFileStore::open(&path, 100).await.unwrap();
        let saved = store
            .save_config(
                StressTestConfig::new(8, 400)
                    .with_name("checkout")
                    .with_request_file("checkout.yaml"),
            )
            .await
            .unwrap();
        config_id = saved.id.unwrap();

        let run = finished(&saved);
        run_id = run.id;
        store.save_run(run).await.unwrap();
    }

    assert!(path.exists());
    assert!(!path.with_extension("json.tmp").exists());

    let reopened = JsonFileStore::open(&path, 100).await.unwrap();
    let config = reopened
        .get_config_by_name("default", "checkout")
        .await
        .unwrap();
    assert_eq!(config.id, Some(config_id));
    assert_eq!(config.concurrent_conns, 8);

    let run = reopened.get_run(run_id).await.unwrap();
    assert_eq!(run.total_requests_completed, 10);
    assert_eq!(run.config_id, Some(config_id));

    // New ids continue after the persisted ones
    let next = reopened
        .save_config(StressTestConfig::new(1, 1).with_name("other"))
        .await
        .unwrap();
    assert_eq!(next.id, Some(config_id + 1));
}

#[tokio::test]
async fn test_failed_change_is_not_persisted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    let store = JsonFileStore::open(&path, 100).await.unwrap();

    store
        .save_config(StressTestConfig::new(1, 1).with_name("a"))
        .await
        .unwrap();
    let err = store
        .save_config(StressTestConfig::new(1, 1).with_name("a"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)));

    let reopened = JsonFileStore::open(&path, 100).await.unwrap();
    assert_eq!(reopened.list_configs("default").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_corrupt_file_is_serialization_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = JsonFileStore::open(&path, 100).await.unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
}

#[tokio::test]
async fn test_from_config_uses_fallback_dir() {
    let dir = TempDir::new().unwrap();
    let config = StorageConfig::default();

    let store = JsonFileStore::from_config(&config, dir.path()).await.unwrap();
    assert_eq!(store.path(), dir.path().join(&config.file_name));
    assert!(store.list_runs("default", 0).await.unwrap().is_empty());
}
