use monolith_domain::config::{BackgroundFailurePolicy, Configuration, ConfigurationInner};
use monolith_domain::environment::HostEnvironment;
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let cfg = Configuration::default();
    assert_eq!(cfg.port, 5000);
    assert!(cfg.address.is_unspecified());
    assert!(cfg.db_connection_string.is_none());
    assert_eq!(cfg.environment, "Production");
    assert_eq!(cfg.background_service_failure, BackgroundFailurePolicy::Ignore);
    assert_eq!(cfg.shutdown_timeout_secs, 30);
    assert!(!cfg.is_development());
}

#[test]
fn configuration_deserializes_flat_keys() {
    let raw = json!({
        "port": 8080,
        "db_connection_string": "postgres://app:secret@db/app",
        "environment": "development",
        "background_service_failure": "stop_host"
    });

    let cfg: Configuration = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.db_connection_string.as_deref(), Some("postgres://app:secret@db/app"));
    assert!(cfg.is_development());
    assert_eq!(cfg.background_service_failure, BackgroundFailurePolicy::StopHost);
    assert_eq!(cfg.log_level, "info");
}

#[test]
fn debug_output_redacts_connection_string() {
    let cfg = Configuration::new(ConfigurationInner {
        db_connection_string: Some("postgres://app:secret@db/app".to_owned()),
        ..ConfigurationInner::default()
    });

    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("secret"));
    assert!(rendered.contains("<redacted 28 chars>"));
}

#[test]
fn with_port_leaves_original_untouched() {
    let cfg = Configuration::default();
    let moved = cfg.with_port(9090);
    assert_eq!(cfg.port, 5000);
    assert_eq!(moved.port, 9090);
}

#[test]
fn host_environment_follows_configuration() {
    let cfg: Configuration =
        serde_json::from_value(json!({ "environment": "Development" })).expect("config");
    let env = HostEnvironment::from_config(&cfg, "1.2.3");

    assert!(env.is_development());
    assert!(env.is_environment("development"));
    assert_eq!(env.version, "1.2.3");
    assert_eq!(env.application, "ModularMonolith");
    assert_eq!(env.content_root, std::env::current_dir().expect("working directory"));
}
