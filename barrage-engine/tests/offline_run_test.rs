//! Runs against the offline HTTP manager with a paused clock

use barrage_config::ExecutionConfig;
use barrage_engine::{Executor, RunStatus, StressTestConfig};
use barrage_http::{HttpManager, HttpMethod, MockResponse, ResolvedRequest};
use std::sync::Arc;
use std::time::Duration;

const URL: &str = "http://offline.test/orders";

fn offline(response: MockResponse) -> Arc<HttpManager> {
    let mut client = HttpManager::new().unwrap();
    client.set_offline();
    client.add_mock(HttpMethod::Get, URL, response);
    Arc::new(client)
}

fn request() -> ResolvedRequest {
    ResolvedRequest::new(HttpMethod::Get, URL)
}

#[tokio::test(start_paused = true)]
async fn test_progress_counters_stay_consistent() {
    let client = offline(MockResponse::new(200, "ok").with_delay(Duration::from_millis(10)));
    let executor = Executor::new(client);

    let yaml = r#"
name: orders
request_file: requests/orders.yaml
concurrent_conns: 5
total_requests: 500
ramp_up_duration_sec: 1
expected_status_codes: [200]
expected_body_exact: ok
"#;
    let config: StressTestConfig = serde_yaml::from_str(yaml).unwrap();
    executor.start(&config, request()).unwrap();

    let mut last_sent = 0;
    loop {
        let progress = executor.snapshot();
        assert!(progress.sent >= last_sent);
        assert!(progress.completed <= progress.sent);
        assert_eq!(
            progress.success + progress.errors + progress.validation_errors,
            progress.completed
        );
        assert!(progress.active_workers <= 5);
        last_sent = progress.sent;

        if progress.finished {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let run = executor.wait().await.unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.total_requests_sent, 500);
    assert_eq!(run.success(), 500);
    assert_eq!(run.config_name, "orders");
}

#[tokio::test(start_paused = true)]
async fn test_request_timeout_is_a_transport_error() {
    let client = offline(MockResponse::new(200, "late").with_delay(Duration::from_secs(5)));
    let settings = ExecutionConfig {
        max_request_timeout: Duration::from_secs(1),
        ..Default::default()
    };
    let executor = Executor::with_settings(client, settings);

    executor
        .start(&StressTestConfig::new(2, 4), request())
        .unwrap();
    let run = executor.wait().await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.total_requests_completed, 4);
    assert_eq!(run.total_errors, 4);
    assert_eq!(run.max_duration_ms, 0);
}

#[tokio::test(start_paused = true)]
async fn test_unmocked_url_fails_every_request() {
    let executor = Executor::new(offline(MockResponse::new(200, "ok")));

    let other = ResolvedRequest::new(HttpMethod::Post, "http://offline.test/elsewhere");
    executor
        .start(&StressTestConfig::new(1, 3), other)
        .unwrap();
    let run = executor.wait().await.unwrap();

    assert_eq!(run.total_errors, 3);
    assert_eq!(run.success(), 0);
}
