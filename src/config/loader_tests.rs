//! Tests for configuration file loading.

use super::*;
use serial_test::serial;
use std::env;
use std::fs;
use std::time::Duration;

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = env::temp_dir().join(name);
    fs::write(&path, contents).expect("Failed to write test config");
    path
}

// ===== Paths =====

#[test]
fn default_config_path_contains_livelog_config_toml() {
    let Some(path) = default_config_path() else {
        return;
    };
    let path_str = path.to_string_lossy();
    assert!(
        path_str.contains("livelog") && path_str.ends_with("config.toml"),
        "Path should contain 'livelog' and end with 'config.toml', got: {}",
        path_str
    );
}

#[test]
fn default_log_path_ends_with_livelog_log() {
    let path = default_log_path();
    assert!(
        path.to_string_lossy().ends_with("livelog.log"),
        "Default log path should end with 'livelog.log', got: {:?}",
        path
    );
}

// ===== load_config_file =====

#[test]
fn load_config_file_returns_ok_none_for_missing_file() {
    let result = load_config_file("/nonexistent/path/to/config.toml");
    assert_eq!(
        result,
        Ok(None),
        "Missing config file should return Ok(None), not an error"
    );
}

#[test]
fn load_config_file_parses_valid_toml() {
    let config_path = write_temp(
        "livelog_test_config.toml",
        r#"
endpoint = "ws://logs.internal:9000/ws"
client_id = "desk-7"
kind = "live_log"
reconnect_delay_ms = 250
max_reconnect_delay_ms = 8000
estimated_row_height = 2
overscan = 10
buffer_capacity = 500
log_file_path = "/tmp/livelog-test.log"
"#,
    );

    let config = load_config_file(&config_path)
        .expect("Should successfully parse valid TOML")
        .expect("Should return Some(ConfigFile) for existing file");

    assert_eq!(config.endpoint.as_deref(), Some("ws://logs.internal:9000/ws"));
    assert_eq!(config.client_id.as_deref(), Some("desk-7"));
    assert_eq!(config.kind.as_deref(), Some("live_log"));
    assert_eq!(config.reconnect_delay_ms, Some(250));
    assert_eq!(config.max_reconnect_delay_ms, Some(8000));
    assert_eq!(config.estimated_row_height, Some(2));
    assert_eq!(config.overscan, Some(10));
    assert_eq!(config.buffer_capacity, Some(500));
    assert_eq!(
        config.log_file_path,
        Some(PathBuf::from("/tmp/livelog-test.log"))
    );

    fs::remove_file(config_path).ok();
}

#[test]
fn load_config_file_returns_error_for_invalid_toml() {
    let config_path = write_temp("livelog_test_invalid.toml", "this is not valid TOML ][}{");

    let result = load_config_file(&config_path);

    match result {
        Err(ConfigError::ParseError { path, reason: _ }) => {
            assert_eq!(path, config_path);
        }
        _ => panic!("Expected ParseError, got {:?}", result),
    }

    fs::remove_file(config_path).ok();
}

#[test]
fn load_config_file_handles_partial_config() {
    let config_path = write_temp(
        "livelog_test_partial.toml",
        r#"
overscan = 3
# Other fields omitted
"#,
    );

    let config = load_config_file(&config_path)
        .expect("Should parse partial config")
        .expect("file exists");
    assert_eq!(config.overscan, Some(3));
    assert_eq!(config.endpoint, None);

    fs::remove_file(config_path).ok();
}

#[test]
fn config_file_rejects_unknown_fields() {
    let result: Result<ConfigFile, _> = toml::from_str("theme = \"dark\"\n");
    assert!(result.is_err(), "Unknown keys should be rejected");
}

#[test]
fn config_file_rejects_negative_capacity() {
    let result: Result<ConfigFile, _> = toml::from_str("buffer_capacity = -1\n");
    assert!(result.is_err());
}

// ===== merge_config =====

#[test]
fn merge_config_uses_defaults_when_none() {
    assert_eq!(merge_config(None), ResolvedConfig::default());
}

#[test]
fn merge_config_overrides_with_config_file_values() {
    let config_file = ConfigFile {
        endpoint: Some("ws://example/ws".to_string()),
        reconnect_delay_ms: Some(2_000),
        buffer_capacity: Some(2_000),
        ..ConfigFile::default()
    };

    let resolved = merge_config(Some(config_file));
    let defaults = ResolvedConfig::default();

    assert_eq!(resolved.endpoint, "ws://example/ws");
    assert_eq!(resolved.reconnect_delay_ms, 2_000);
    assert_eq!(resolved.buffer_capacity, Some(2_000));
    assert_eq!(resolved.kind, defaults.kind);
    assert_eq!(resolved.overscan, defaults.overscan);
    assert_eq!(resolved.log_file_path, defaults.log_file_path);
}

#[test]
fn resolved_config_default_has_expected_values() {
    let config = ResolvedConfig::default();

    assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(config.client_id, None);
    assert_eq!(config.kind, "live_log");
    assert_eq!(config.reconnect_delay_ms, 1_000);
    assert_eq!(config.max_reconnect_delay_ms, None);
    assert_eq!(config.estimated_row_height, 1);
    assert_eq!(config.overscan, 5);
    assert!(!config.log_file_path.as_os_str().is_empty());
}

// ===== Derived settings =====

#[test]
fn session_config_defaults_to_random_client_and_fixed_delay() {
    let config = ResolvedConfig::default();

    let first = config.session_config().expect("valid");
    let second = config.session_config().expect("valid");

    assert_ne!(first.target.client_id, second.target.client_id);
    assert_eq!(first.policy, ReconnectPolicy::Fixed(Duration::from_secs(1)));
    assert_eq!(first.target.endpoint, DEFAULT_ENDPOINT);
}

#[test]
fn session_config_uses_exponential_policy_when_capped() {
    let config = ResolvedConfig {
        reconnect_delay_ms: 100,
        max_reconnect_delay_ms: Some(5_000),
        client_id: Some("fixed".to_string()),
        ..ResolvedConfig::default()
    };

    let session = config.session_config().expect("valid");

    assert_eq!(session.target.client_id.as_str(), "fixed");
    assert_eq!(
        session.policy,
        ReconnectPolicy::Exponential {
            initial: Duration::from_millis(100),
            max: Duration::from_secs(5),
        }
    );
}

#[test]
fn session_config_rejects_empty_client_id() {
    let config = ResolvedConfig {
        client_id: Some(String::new()),
        ..ResolvedConfig::default()
    };

    assert!(matches!(
        config.session_config(),
        Err(ConfigError::InvalidValue { field: "client_id", .. })
    ));
}

#[test]
fn session_config_rejects_zero_reconnect_delay() {
    let config = ResolvedConfig {
        reconnect_delay_ms: 0,
        ..ResolvedConfig::default()
    };

    assert!(matches!(
        config.session_config(),
        Err(ConfigError::InvalidValue { field: "reconnect_delay_ms", .. })
    ));
}

#[test]
fn session_config_accepts_one_millisecond_delay() {
    let config = ResolvedConfig {
        reconnect_delay_ms: 1,
        ..ResolvedConfig::default()
    };

    let session = config.session_config().expect("valid delay");
    assert_eq!(
        session.policy,
        ReconnectPolicy::Fixed(Duration::from_millis(1))
    );
}

#[test]
fn message_kind_rejects_empty_kind() {
    let config = ResolvedConfig {
        kind: String::new(),
        ..ResolvedConfig::default()
    };

    assert!(matches!(
        config.message_kind(),
        Err(ConfigError::InvalidValue { field: "kind", .. })
    ));
}

#[test]
fn pipeline_settings_rejects_zero_row_height() {
    let config = ResolvedConfig {
        estimated_row_height: 0,
        ..ResolvedConfig::default()
    };

    assert_eq!(
        config.pipeline_settings(),
        Err(ConfigurationError::ZeroRowHeight)
    );
}

#[test]
fn pipeline_settings_carries_capacity_and_overscan() {
    let config = ResolvedConfig {
        overscan: 2,
        buffer_capacity: None,
        ..ResolvedConfig::default()
    };

    let settings = config.pipeline_settings().expect("valid");

    assert_eq!(settings.engine.overscan.get(), 2);
    assert_eq!(settings.capacity, None);
}

// ===== Environment =====

/// RAII guard to ensure environment variable cleanup even under test parallelism.
struct EnvGuard(&'static str);

impl EnvGuard {
    fn new(name: &'static str) -> Self {
        env::remove_var(name);
        EnvGuard(name)
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        env::remove_var(self.0);
    }
}

#[test]
#[serial(livelog_env)]
fn apply_env_overrides_respects_endpoint_and_client_id() {
    let _endpoint = EnvGuard::new("LIVELOG_ENDPOINT");
    let _client = EnvGuard::new("LIVELOG_CLIENT_ID");
    env::set_var("LIVELOG_ENDPOINT", "ws://env-host/ws");
    env::set_var("LIVELOG_CLIENT_ID", "env-client");

    let result = apply_env_overrides(ResolvedConfig::default());

    assert_eq!(result.endpoint, "ws://env-host/ws");
    assert_eq!(result.client_id.as_deref(), Some("env-client"));
    assert_eq!(result.kind, ResolvedConfig::default().kind);
}

#[test]
#[serial(livelog_env)]
fn apply_env_overrides_no_change_when_env_var_not_set() {
    let _endpoint = EnvGuard::new("LIVELOG_ENDPOINT");
    let _client = EnvGuard::new("LIVELOG_CLIENT_ID");

    let base = ResolvedConfig::default();
    let result = apply_env_overrides(base.clone());

    assert_eq!(result, base);
}

#[test]
#[serial(livelog_config)]
fn load_config_with_precedence_prefers_explicit_path() {
    let _guard = EnvGuard::new("LIVELOG_CONFIG");
    let explicit_path = write_temp("livelog_explicit.toml", "overscan = 11\n");
    let env_path = write_temp("livelog_env.toml", "overscan = 22\n");
    env::set_var("LIVELOG_CONFIG", &env_path);

    let config = load_config_with_precedence(Some(explicit_path.clone()))
        .expect("valid")
        .expect("file exists");

    assert_eq!(
        config.overscan,
        Some(11),
        "Should use explicit path, not LIVELOG_CONFIG env var"
    );

    fs::remove_file(explicit_path).ok();
    fs::remove_file(env_path).ok();
}

#[test]
#[serial(livelog_config)]
fn load_config_with_precedence_uses_env_var_when_no_explicit_path() {
    let _guard = EnvGuard::new("LIVELOG_CONFIG");
    let env_path = write_temp("livelog_env_only.toml", "overscan = 33\n");
    env::set_var("LIVELOG_CONFIG", &env_path);

    let config = load_config_with_precedence(None)
        .expect("valid")
        .expect("file exists");

    assert_eq!(config.overscan, Some(33));

    fs::remove_file(env_path).ok();
}

#[test]
#[serial(livelog_config)]
fn load_config_with_precedence_rejects_empty_env_path() {
    let _guard = EnvGuard::new("LIVELOG_CONFIG");
    env::set_var("LIVELOG_CONFIG", "");

    assert!(matches!(
        load_config_with_precedence(None),
        Err(ConfigError::InvalidPath(_))
    ));
}

// ===== CLI =====

#[test]
fn apply_cli_overrides_no_overrides() {
    let base = ResolvedConfig::default();
    assert_eq!(apply_cli_overrides(base.clone(), CliOverrides::default()), base);
}

#[test]
fn apply_cli_overrides_replaces_only_given_values() {
    let overrides = CliOverrides {
        kind: Some("audit".to_string()),
        capacity: Some(50),
        ..CliOverrides::default()
    };

    let result = apply_cli_overrides(ResolvedConfig::default(), overrides);

    assert_eq!(result.kind, "audit");
    assert_eq!(result.buffer_capacity, Some(50));
    assert_eq!(result.endpoint, DEFAULT_ENDPOINT);
}

#[test]
#[serial(livelog_env)]
fn precedence_chain_full_defaults_to_cli() {
    let _endpoint = EnvGuard::new("LIVELOG_ENDPOINT");
    let _client = EnvGuard::new("LIVELOG_CLIENT_ID");

    let file = ConfigFile {
        endpoint: Some("ws://file/ws".to_string()),
        client_id: Some("file-client".to_string()),
        overscan: Some(8),
        ..ConfigFile::default()
    };
    env::set_var("LIVELOG_ENDPOINT", "ws://env/ws");

    let resolved = apply_cli_overrides(
        apply_env_overrides(merge_config(Some(file))),
        CliOverrides {
            client_id: Some("cli-client".to_string()),
            ..CliOverrides::default()
        },
    );

    assert_eq!(resolved.endpoint, "ws://env/ws", "env beats file");
    assert_eq!(resolved.client_id.as_deref(), Some("cli-client"), "cli beats file");
    assert_eq!(resolved.overscan, 8, "file beats defaults");
}
