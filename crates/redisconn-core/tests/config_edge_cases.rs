use std::fs;
use std::path::PathBuf;

use redisconn_core::config::{ConfigError, ConfigSnapshot, vars};
use serial_test::serial;
use tempfile::TempDir;

/// Returns true if running as root (euid == 0). Used to skip permission tests.
#[cfg(unix)]
fn is_root() -> bool {
    std::process::Command::new("id")
        .arg("-u")
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim() == "0")
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// 1. Nonexistent path
// ---------------------------------------------------------------------------

#[test]
fn load_from_nonexistent_path_returns_empty_snapshot() {
    let path = PathBuf::from("/tmp/redisconn-test-nonexistent/does/not/exist/config.toml");
    assert!(!path.exists());

    let snapshot =
        ConfigSnapshot::load_from_path(&path).expect("should not error on missing path");
    assert_eq!(snapshot, ConfigSnapshot::default());
}

// ---------------------------------------------------------------------------
// 2. Empty config file
// ---------------------------------------------------------------------------

#[test]
fn load_empty_config_file_returns_empty_snapshot() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "").unwrap();

    let snapshot =
        ConfigSnapshot::load_from_path(&config_path).expect("empty file should parse");
    assert_eq!(snapshot, ConfigSnapshot::default());
}

// ---------------------------------------------------------------------------
// 3. Corrupt / invalid TOML
// ---------------------------------------------------------------------------

#[test]
fn load_corrupt_toml_returns_parse_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "[[[broken").unwrap();

    let err = ConfigSnapshot::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
    assert!(
        err.to_string().contains("parse"),
        "error should mention parsing: {err}"
    );
}

#[test]
fn load_wrong_value_type_returns_parse_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "prefix = 5\n").unwrap();

    assert!(matches!(
        ConfigSnapshot::load_from_path(&config_path),
        Err(ConfigError::ParseError(_))
    ));
}

// ---------------------------------------------------------------------------
// 4. Unknown fields and blank values
// ---------------------------------------------------------------------------

#[test]
fn load_config_with_unknown_fields_ignores_them() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");

    let content = r#"
unknown_top_level_key = "hello"
prefix = "app:"
connection_method = "no-auth"
instance_url = "redis://localhost:6379"
"#;
    fs::write(&config_path, content).unwrap();

    let snapshot = ConfigSnapshot::load_from_path(&config_path)
        .expect("unknown fields should be silently ignored");
    assert_eq!(snapshot.prefix.as_deref(), Some("app:"));
    assert_eq!(
        snapshot.instance_url.as_deref(),
        Some("redis://localhost:6379")
    );
}

#[test]
fn load_blank_values_are_absent() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "prefix = \"\"\ncertificate_path = \"\"\n").unwrap();

    let snapshot = ConfigSnapshot::load_from_path(&config_path).unwrap();
    assert!(snapshot.prefix.is_none());
    assert!(snapshot.certificate_path.is_none());
}

// ---------------------------------------------------------------------------
// 5. Permission errors (unix only)
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn load_unreadable_file_returns_clear_error() {
    use std::os::unix::fs::PermissionsExt;

    if is_root() {
        eprintln!("skipping test: running as root");
        return;
    }

    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "# valid toml").unwrap();
    fs::set_permissions(&config_path, fs::Permissions::from_mode(0o000)).unwrap();

    let err = ConfigSnapshot::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::LoadError { .. }));
    assert!(err.to_string().contains("config.toml"));

    // Restore so TempDir cleanup succeeds
    fs::set_permissions(&config_path, fs::Permissions::from_mode(0o644)).unwrap();
}

// ---------------------------------------------------------------------------
// 6. Layered loading
// ---------------------------------------------------------------------------

fn clear_env() {
    for var in [
        vars::PREFIX,
        vars::CONNECTION_METHOD,
        vars::INSTANCE_URL,
        vars::CLIENT_OPTIONS,
        vars::CONFIG_FILE,
    ] {
        unsafe {
            std::env::remove_var(var);
        }
    }
}

#[test]
#[serial]
fn load_layered_environment_wins_over_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
prefix = "file:"
connection_method = "no-auth"
instance_url = "redis://file-host:6379"
"#,
    )
    .unwrap();

    unsafe {
        std::env::set_var(vars::PREFIX, "env:");
    }

    let snapshot = ConfigSnapshot::load_layered(Some(&config_path)).unwrap();
    assert_eq!(snapshot.prefix.as_deref(), Some("env:"));
    assert_eq!(snapshot.connection_method.as_deref(), Some("no-auth"));
    assert_eq!(
        snapshot.instance_url.as_deref(),
        Some("redis://file-host:6379")
    );

    clear_env();
}

#[test]
#[serial]
fn load_layered_reads_config_file_variable() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("custom.toml");
    fs::write(&config_path, "prefix = \"from-var:\"\n").unwrap();

    unsafe {
        std::env::set_var(vars::CONFIG_FILE, &config_path);
    }

    let snapshot = ConfigSnapshot::load_layered(None).unwrap();
    assert_eq!(snapshot.prefix.as_deref(), Some("from-var:"));

    clear_env();
}

#[test]
#[serial]
fn load_layered_expands_environment_references() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        "instance_url = \"redis://${REDISCONN_EDGE_HOST:-localhost}:6379\"\n",
    )
    .unwrap();

    let snapshot = ConfigSnapshot::load_layered(Some(&config_path)).unwrap();
    assert_eq!(
        snapshot.instance_url.as_deref(),
        Some("redis://localhost:6379")
    );
}

#[test]
#[serial]
fn load_layered_malformed_client_options_are_deferred() {
    clear_env();
    unsafe {
        std::env::set_var(vars::PREFIX, "app:");
        std::env::set_var(vars::CLIENT_OPTIONS, "{oops");
    }

    let path = PathBuf::from("/tmp/redisconn-test-nonexistent/config.toml");
    let snapshot = ConfigSnapshot::load_layered(Some(&path)).expect("loading never parses options");
    assert!(matches!(
        snapshot.client_options(),
        Err(ConfigError::ClientOptionsParse { .. })
    ));

    clear_env();
}
