use barrage_config::domains::logging::{LogFormat, LogLevel, LogTarget};
use barrage_config::*;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use temp_env::{with_vars, with_vars_unset};

const OVERRIDES: [&str; 11] = [
    "BARRAGE_MAX_CONCURRENT_CONNS",
    "BARRAGE_PROGRESS_INTERVAL_MS",
    "BARRAGE_REQUEST_TIMEOUT",
    "BARRAGE_PROFILE",
    "BARRAGE_HTTP_TIMEOUT",
    "BARRAGE_HTTP_USER_AGENT",
    "BARRAGE_HTTP_VERIFY_SSL",
    "BARRAGE_LOG_LEVEL",
    "BARRAGE_LOG_FORMAT",
    "BARRAGE_DATA_DIR",
    "BARRAGE_MAX_RUNS_PER_PROFILE",
];

fn settings_file(yaml: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

#[test]
fn test_env_overrides_apply_on_top_of_defaults() {
    let vars = vec![
        ("BARRAGE_HTTP_TIMEOUT", Some("90s")),
        ("BARRAGE_LOG_LEVEL", Some("debug")),
        ("BARRAGE_MAX_CONCURRENT_CONNS", Some("250")),
        ("BARRAGE_PROGRESS_INTERVAL_MS", Some("100")),
        ("BARRAGE_REQUEST_TIMEOUT", Some("5")),
        ("BARRAGE_PROFILE", Some("staging")),
        ("BARRAGE_DATA_DIR", Some("/tmp/barrage-test")),
        ("BARRAGE_MAX_RUNS_PER_PROFILE", Some("7")),
    ];

    with_vars(vars, || {
        let config = ConfigLoader::new().from_env().unwrap();

        assert_eq!(config.http.timeout, Duration::from_secs(90));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.execution.max_concurrent_conns, 250);
        assert_eq!(config.execution.progress_interval, Duration::from_millis(100));
        assert_eq!(config.execution.max_request_timeout, Duration::from_secs(5));
        assert_eq!(config.execution.default_profile, "staging");
        assert_eq!(config.storage.max_runs_per_profile, 7);
        assert_eq!(
            config.storage.store_path(),
            Some(PathBuf::from("/tmp/barrage-test/stress-tests.json"))
        );
    });
}

#[test]
fn test_unparsable_override_names_the_variable() {
    with_vars(vec![("BARRAGE_HTTP_VERIFY_SSL", Some("maybe"))], || {
        match ConfigLoader::new().from_env() {
            Err(ConfigError::EnvError { var, .. }) => assert_eq!(var, "BARRAGE_HTTP_VERIFY_SSL"),
            other => panic!("expected EnvError, got {:?}", other),
        }
    });

    with_vars(vec![("BARRAGE_HTTP_TIMEOUT", Some("soon"))], || {
        let err = ConfigLoader::new().from_env().unwrap_err();
        assert!(err.to_string().starts_with("environment variable BARRAGE_HTTP_TIMEOUT is invalid"));
    });
}

#[test]
fn test_override_out_of_range_fails_validation() {
    with_vars(vec![("BARRAGE_MAX_CONCURRENT_CONNS", Some("5000"))], || {
        let err = ConfigLoader::new().from_env().unwrap_err();
        assert_eq!(err.domain_name(), Some("execution"));
    });
}

#[test]
fn test_custom_prefix() {
    with_vars(
        vec![("LOADTEST_LOG_FORMAT", Some("json")), ("BARRAGE_LOG_FORMAT", Some("pretty"))],
        || {
            let config = ConfigLoader::with_prefix("LOADTEST").from_env().unwrap();
            assert_eq!(config.logging.format, LogFormat::Json);
        },
    );
}

#[test]
fn test_full_settings_file() {
    let file = settings_file(
        r#"
execution:
  max_concurrent_conns: 200
  progress_interval: 1s
  max_request_timeout: 15
  default_profile: staging

http:
  timeout: 45
  connect_timeout: 500ms
  user_agent: "Test Agent"
  verify_ssl: false
  pool:
    max_idle_per_host: 64
  proxy:
    https: http://proxy.internal:3128

logging:
  level: warn
  format: json
  targets:
    - type: console
    - type: file
      path: /var/log/barrage.log
      level: trace

storage:
  data_dir: /var/lib/barrage
  max_runs_per_profile: 20
"#,
    );

    let config = with_vars_unset(OVERRIDES, || ConfigLoader::new().from_file(file.path())).unwrap();

    assert_eq!(config.execution.max_concurrent_conns, 200);
    assert_eq!(config.execution.progress_interval, Duration::from_secs(1));
    assert_eq!(config.execution.default_profile, "staging");
    assert_eq!(config.http.timeout, Duration::from_secs(45));
    assert_eq!(config.http.connect_timeout, Duration::from_millis(500));
    assert_eq!(config.http.pool.max_idle_per_host, 64);
    assert_eq!(config.http.proxy.https.as_deref(), Some("http://proxy.internal:3128"));
    assert!(!config.http.verify_ssl);
    assert_eq!(config.logging.level, LogLevel::Warn);
    assert_eq!(
        config.logging.targets[1],
        LogTarget::File {
            path: PathBuf::from("/var/log/barrage.log"),
            level: Some(LogLevel::Trace),
        }
    );
    assert_eq!(
        config.storage.store_path(),
        Some(PathBuf::from("/var/lib/barrage/stress-tests.json"))
    );
}

#[test]
fn test_environment_beats_file() {
    let file = settings_file("logging:\n  level: warn\n");
    let config = with_vars(vec![("BARRAGE_LOG_LEVEL", Some("trace"))], || {
        ConfigLoader::new().load(Some(file.path()))
    })
    .unwrap();
    assert_eq!(config.logging.level, LogLevel::Trace);
}

#[test]
fn test_empty_file_means_defaults() {
    let file = settings_file("\n");
    let config = with_vars_unset(OVERRIDES, || ConfigLoader::new().from_file(file.path())).unwrap();
    assert_eq!(config.execution.max_concurrent_conns, 1000);
    assert_eq!(config.storage.file_name, "stress-tests.json");
}

#[test]
fn test_bad_files() {
    let missing = ConfigLoader::new().from_file("/definitely/not/here.yaml");
    assert!(matches!(missing, Err(ConfigError::FileReadError(_))));

    let malformed = settings_file("execution: [1, 2\n");
    assert!(matches!(
        ConfigLoader::new().from_file(malformed.path()),
        Err(ConfigError::ParseError(_))
    ));

    let invalid = settings_file("http:\n  timeout: 5\n  connect_timeout: 10\n");
    let err = with_vars_unset(OVERRIDES, || ConfigLoader::new().from_file(invalid.path())).unwrap_err();
    assert_eq!(err.domain_name(), Some("http"));
}
