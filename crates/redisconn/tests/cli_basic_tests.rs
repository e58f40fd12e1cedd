use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

/// Helper to create a test command with an empty environment
fn redisconn() -> Command {
    let mut cmd = Command::cargo_bin("redisconn").unwrap();
    cmd.env_clear()
        .env("NO_COLOR", "1")
        .env("REDISCONN_CONFIG_FILE", "/tmp/redisconn-cli-test/none.toml");
    cmd
}

fn no_auth() -> Command {
    let mut cmd = redisconn();
    cmd.env("REDIS_PREFIX", "app:")
        .env("REDIS_CONNECTION_METHOD", "no-auth")
        .env("REDIS_INSTANCE_URL", "redis://localhost:6379");
    cmd
}

#[test]
fn test_help_flag() {
    redisconn()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("environment-configured Redis"))
        .stdout(predicate::str::contains("EXAMPLES:"));
}

#[test]
fn test_version_flag() {
    redisconn()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("redisconn"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_args_shows_help() {
    redisconn()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_invalid_subcommand() {
    redisconn()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_check_without_prefix_fails() {
    redisconn()
        .env("REDIS_CONNECTION_METHOD", "no-auth")
        .arg("check")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("REDIS_PREFIX"))
        .stderr(predicate::str::contains("tip"));
}

#[test]
fn test_check_without_method_fails() {
    redisconn()
        .env("REDIS_PREFIX", "app:")
        .arg("check")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("REDIS_CONNECTION_METHOD"))
        .stderr(predicate::str::contains("direct-ssl-tls"));
}

#[test]
fn test_check_unsupported_method_fails() {
    redisconn()
        .env("REDIS_PREFIX", "app:")
        .env("REDIS_CONNECTION_METHOD", "carrier-pigeon")
        .arg("check")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("carrier-pigeon"));
}

#[test]
fn test_check_not_configured_lists_missing_values() {
    redisconn()
        .env("REDIS_PREFIX", "app:")
        .env("REDIS_CONNECTION_METHOD", "basic-auth")
        .arg("check")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("REDIS_INSTANCE_URL"))
        .stderr(predicate::str::contains("REDIS_BASIC_AUTH_PASS"));
}

#[test]
fn test_check_no_auth_succeeds() {
    no_auth()
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"method\": \"no-auth\""))
        .stdout(predicate::str::contains("\"key_prefix\": \"app:\""));
}

#[test]
fn test_check_yaml_output() {
    no_auth()
        .args(["check", "-o", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("method: no-auth"));
}

#[test]
fn test_check_table_output() {
    no_auth()
        .args(["check", "-o", "table"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Field"))
        .stdout(predicate::str::contains("no-auth"));
}

#[test]
fn test_check_basic_auth_redacts_password() {
    redisconn()
        .env("REDIS_PREFIX", "app:")
        .env("REDIS_CONNECTION_METHOD", "basic-auth")
        .env("REDIS_INSTANCE_URL", "redis://host:6379")
        .env("REDIS_BASIC_AUTH_USER", "ada")
        .env("REDIS_BASIC_AUTH_PASS", "hunter2")
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("redis://ada@host:6379"))
        .stdout(predicate::str::contains("\"credential_storage\": \"plaintext\""))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_check_direct_tls_with_certificate() {
    let mut cert = NamedTempFile::new().unwrap();
    write!(
        cert,
        "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n"
    )
    .unwrap();

    redisconn()
        .env("REDIS_PREFIX", "app:")
        .env("REDIS_CONNECTION_METHOD", "direct-ssl-tls")
        .env("REDIS_SSL_CERT", cert.path())
        .env("REDIS_COMPOSED_URL", "rediss://tls.example:6380")
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"trust_anchors\": 1"));
}

#[test]
fn test_check_direct_tls_missing_certificate_file() {
    redisconn()
        .env("REDIS_PREFIX", "app:")
        .env("REDIS_CONNECTION_METHOD", "direct-ssl-tls")
        .env("REDIS_CERT", "/nonexistent/redisconn/ca.pem")
        .env("REDIS_URL", "rediss://tls.example:6380")
        .arg("check")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("ca.pem"));
}

#[test]
fn test_check_reads_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
prefix = "file:"
connection_method = "no-auth"
instance_url = "redis://file-host:6379"
"#,
    )
    .unwrap();

    redisconn()
        .arg("--config-file")
        .arg(&path)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("redis://file-host:6379"))
        .stdout(predicate::str::contains("file:"));
}

#[test]
fn test_check_malformed_client_options() {
    no_auth()
        .env("REDIS_CLIENT_OPTS", "{not json")
        .arg("check")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("REDIS_CLIENT_OPTS"));
}

#[test]
fn test_set_requires_field_value_pairs() {
    no_auth()
        .args(["set", "session:1", "novalue"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("expected field=value"));
}

#[test]
fn test_ping_unreachable_server_fails() {
    redisconn()
        .env("REDIS_PREFIX", "app:")
        .env("REDIS_CONNECTION_METHOD", "no-auth")
        .env("REDIS_INSTANCE_URL", "redis://127.0.0.1:1")
        .env(
            "REDIS_CLIENT_OPTS",
            r#"{"readyTimeoutMs": 2000, "connectTimeoutMs": 500, "reconnect": {"retries": 0}}"#,
        )
        .arg("ping")
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"));
}
