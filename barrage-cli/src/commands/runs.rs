//! `barrage runs` handlers

use anyhow::{Context, Result};
use barrage_engine::Run;
use barrage_storage::StressTestStore;
use uuid::Uuid;

use super::{short_id, CommandOutput};
use crate::formatter::format_duration_ms;

pub async fn list(store: &dyn StressTestStore, profile: &str, limit: usize) -> Result<CommandOutput> {
    let runs = store.list_runs(profile, limit).await?;

    let headers = [
        "ID", "Config", "Status", "Started", "Duration", "Sent", "OK", "Errors", "Invalid", "p50",
        "p99", "req/s",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    let rows = runs.iter().map(run_row).collect();

    Ok(CommandOutput::Table { headers, rows })
}

fn run_row(run: &Run) -> Vec<String> {
    let config = if run.is_scratch() {
        "(ad hoc)".to_string()
    } else {
        run.config_name.clone()
    };
    let duration = run
        .duration()
        .map(|d| format_duration_ms(d.num_milliseconds().max(0) as u64))
        .unwrap_or_else(|| "-".to_string());

    vec![
        short_id(&run.id),
        config,
        run.status.to_string(),
        run.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        duration,
        run.total_requests_sent.to_string(),
        run.success().to_string(),
        run.total_errors.to_string(),
        run.total_validation_errors.to_string(),
        format!("{}ms", run.p50_duration_ms),
        format!("{}ms", run.p99_duration_ms),
        format!("{:.1}", run.requests_per_second),
    ]
}

/// Parse a full run id
fn parse_run_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).with_context(|| format!("'{}' is not a valid run id", id))
}

pub async fn show(store: &dyn StressTestStore, id: &str, json: bool) -> Result<CommandOutput> {
    let run = store.get_run(parse_run_id(id)?).await?;

    if json {
        Ok(CommandOutput::Json {
            data: serde_json::to_value(&run)?,
        })
    } else {
        Ok(CommandOutput::Report { run: Box::new(run) })
    }
}

pub async fn delete(store: &dyn StressTestStore, id: &str) -> Result<CommandOutput> {
    let id = parse_run_id(id)?;
    store.delete_run(id).await?;

    Ok(CommandOutput::Success {
        message: format!("Deleted run {}", id),
        data: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use barrage_engine::RunStatus;
    use barrage_storage::testing::{finished_run, saved_config, MockStore};
    use barrage_storage::StoreError;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn test_list_runs_table() {
        let config = saved_config(1, "alpha");
        let mut run = finished_run(&config, RunStatus::Cancelled);
        run.total_requests_sent = 12;
        run.total_requests_completed = 10;
        run.total_errors = 1;
        let expected_id = short_id(&run.id);

        let mut store = MockStore::new();
        store
            .expect_list_runs()
            .withf(|profile: &str, limit: &usize| profile == "default" && *limit == 5)
            .times(1)
            .returning(move |_, _| Ok(vec![run.clone()]));

        match list(&store, "default", 5).await.unwrap() {
            CommandOutput::Table { headers, rows } => {
                assert_eq!(headers.len(), rows[0].len());
                assert_eq!(rows[0][0], expected_id);
                assert_eq!(rows[0][1], "alpha");
                assert_eq!(rows[0][2], "cancelled");
                assert_eq!(rows[0][5], "12");
                assert_eq!(rows[0][6], "9");
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_show_run() {
        let run = finished_run(&saved_config(1, "alpha"), RunStatus::Completed);
        let id = run.id;

        let mut store = MockStore::new();
        store
            .expect_get_run()
            .with(eq(id))
            .times(2)
            .returning(move |_| Ok(run.clone()));

        let report = show(&store, &id.to_string(), false).await.unwrap();
        assert!(matches!(report, CommandOutput::Report { run } if run.id == id));

        match show(&store, &id.to_string(), true).await.unwrap() {
            CommandOutput::Json { data } => assert_eq!(data["status"], "completed"),
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_run_id_skips_store() {
        let mut store = MockStore::new();
        store.expect_get_run().never();
        store.expect_delete_run().never();

        assert!(show(&store, "not-a-uuid", false).await.is_err());
        assert!(delete(&store, "1234").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_missing_run() {
        let id = Uuid::new_v4();
        let mut store = MockStore::new();
        store
            .expect_delete_run()
            .with(eq(id))
            .returning(|id| Err(StoreError::NotFound(format!("run {}", id))));

        let err = delete(&store, &id.to_string()).await.unwrap_err();
        assert_eq!(err.to_string(), format!("run {} not found", id));
    }
}
