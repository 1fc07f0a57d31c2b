use barrage_config::domains::logging::{LogFormat, LogLevel, LogTarget};
use barrage_config::LoggingConfig;
use barrage_logging::init_logging_from_config;
use tempfile::tempdir;

#[test]
fn test_logging_config_from_yaml() {
    let yaml_config = r#"
level: debug
format: json
targets:
  - type: console
    level: info
  - type: file
    path: /tmp/barrage.log
"#;

    let config: LoggingConfig = serde_yaml::from_str(yaml_config).unwrap();

    assert_eq!(config.level, LogLevel::Debug);
    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.targets.len(), 2);
    assert!(matches!(
        config.targets[0],
        LogTarget::Console {
            level: Some(LogLevel::Info)
        }
    ));
}

#[test]
fn test_file_target_receives_events() {
    let temp_dir = tempdir().unwrap();
    let log_path = temp_dir.path().join("run.log");

    let config = LoggingConfig {
        level: LogLevel::Info,
        format: LogFormat::Json,
        targets: vec![LogTarget::File {
            path: log_path.clone(),
            level: None,
        }],
        include_location: false,
    };

    let guard = init_logging_from_config(&config).unwrap();
    tracing::info!(run_id = "abc", "stress test finished");
    drop(guard);

    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert!(contents.contains("stress test finished"));
    assert!(contents.contains("\"run_id\":\"abc\""));
}
