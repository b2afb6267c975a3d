//! Environment binding is checked in child processes: each case re-runs this test binary
//! with its own `MONOLITH_*` variables, so the parent environment is never touched.

use monolith_kernel::config::load_configuration;
use monolith_kernel::domain::config::BackgroundFailurePolicy;
use std::process::Command;

const CHILD_MARKER: &str = "MONOLITH_ENV_CONFIG_CHILD";

fn run_in_child(test: &str, vars: &[(&str, &str)]) {
    let exe = std::env::current_exe().expect("test binary");
    let output = Command::new(exe)
        .args(["--exact", test, "--ignored", "--test-threads=1", "--nocapture"])
        .env(CHILD_MARKER, "1")
        .envs(vars.iter().copied())
        .output()
        .expect("spawn child");

    assert!(
        output.status.success(),
        "child `{test}` failed:\n{}\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn is_child() -> bool {
    std::env::var_os(CHILD_MARKER).is_some()
}

#[test]
fn prefixed_variables_override_defaults() {
    run_in_child(
        "child_prefixed_variables",
        &[
            ("MONOLITH_PORT", "7002"),
            ("MONOLITH_DB_CONNECTION_STRING", "postgres://music:secret@db/catalog"),
            ("MONOLITH_ENVIRONMENT", "Development"),
            ("MONOLITH_BACKGROUND_SERVICE_FAILURE", "stop_host"),
            ("MONOLITH_LOG_JSON", "true"),
        ],
    );
}

#[test]
#[ignore = "runs in a child process"]
fn child_prefixed_variables() {
    if !is_child() {
        return;
    }
    let cfg = load_configuration().expect("configuration");

    assert_eq!(cfg.port, 7002);
    assert_eq!(cfg.db_connection_string.as_deref(), Some("postgres://music:secret@db/catalog"));
    assert!(cfg.is_development());
    assert_eq!(cfg.background_service_failure, BackgroundFailurePolicy::StopHost);
    assert!(cfg.log_json);
    assert_eq!(cfg.shutdown_timeout_secs, 30);
}

#[test]
fn numeric_connection_string_stays_text() {
    run_in_child("child_numeric_connection_string", &[("MONOLITH_DB_CONNECTION_STRING", "12345")]);
}

#[test]
#[ignore = "runs in a child process"]
fn child_numeric_connection_string() {
    if !is_child() {
        return;
    }
    let cfg = load_configuration().expect("configuration");

    assert_eq!(cfg.db_connection_string.as_deref(), Some("12345"));
    assert_eq!(cfg.port, 5000);
}

#[test]
fn malformed_port_fails_loading() {
    run_in_child("child_malformed_port", &[("MONOLITH_PORT", "not-a-port")]);
}

#[test]
#[ignore = "runs in a child process"]
fn child_malformed_port() {
    if !is_child() {
        return;
    }
    let err = load_configuration().expect_err("port must be numeric");
    assert!(err.to_string().contains("Failed to deserialize config"));
}
