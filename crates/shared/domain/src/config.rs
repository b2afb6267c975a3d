use crate::constants::{DEVELOPMENT, PRODUCTION};
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;

/// Flat application settings, bound from `MONOLITH_*` environment variables.
///
/// Every field has a default so that a bare environment still yields a usable
/// configuration; only the connection string has no meaningful fallback.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ConfigurationInner {
    /// Listen address (`MONOLITH_ADDRESS`).
    pub address: IpAddr,
    /// Listen port (`MONOLITH_PORT`).
    pub port: u16,
    /// Opaque datastore DSN handed to modules (`MONOLITH_DB_CONNECTION_STRING`).
    pub db_connection_string: Option<String>,
    /// Hosting environment name (`MONOLITH_ENVIRONMENT`).
    pub environment: String,
    /// Default log level (`MONOLITH_LOG_LEVEL`).
    pub log_level: String,
    /// Extra `tracing` filter directives, e.g. `monolith_kernel=debug`.
    pub log_filter: Option<String>,
    /// Emit JSON lines to the log file.
    pub log_json: bool,
    /// Directory for rolling log files; console only when unset.
    pub log_dir: Option<PathBuf>,
    /// What happens when a hosted background service fails.
    pub background_service_failure: BackgroundFailurePolicy,
    /// Grace period for in-flight requests on shutdown.
    pub shutdown_timeout_secs: u64,
}

/// Reaction of the host to a failed hosted background service.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundFailurePolicy {
    /// Log the failure and keep serving.
    #[default]
    Ignore,
    /// Log the failure and initiate a graceful host shutdown.
    StopHost,
}

/// Immutable, Arc-wrapped configuration for inexpensive cloning into modules.
#[derive(Default, Clone, Deserialize)]
pub struct Configuration {
    #[serde(flatten)]
    inner: Arc<ConfigurationInner>,
}

impl Configuration {
    #[must_use]
    pub fn new(inner: ConfigurationInner) -> Self {
        Self { inner: Arc::new(inner) }
    }

    /// Returns a copy with a different listen port.
    #[must_use]
    pub fn with_port(&self, port: u16) -> Self {
        let mut inner = (*self.inner).clone();
        inner.port = port;
        Self::new(inner)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        self.inner.environment.eq_ignore_ascii_case(DEVELOPMENT)
    }
}

impl Deref for Configuration {
    type Target = ConfigurationInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<ConfigurationInner> for Configuration {
    fn from(inner: ConfigurationInner) -> Self {
        Self::new(inner)
    }
}

impl Default for ConfigurationInner {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            db_connection_string: None,
            environment: PRODUCTION.to_owned(),
            log_level: "info".to_owned(),
            log_filter: None,
            log_json: false,
            log_dir: None,
            background_service_failure: BackgroundFailurePolicy::Ignore,
            shutdown_timeout_secs: 30,
        }
    }
}

// Credentials must never reach the logs.
impl fmt::Debug for ConfigurationInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("address", &self.address)
            .field("port", &self.port)
            .field(
                "db_connection_string",
                &self.db_connection_string.as_ref().map(|s| format!("<redacted {} chars>", s.len())),
            )
            .field("environment", &self.environment)
            .field("log_level", &self.log_level)
            .field("log_filter", &self.log_filter)
            .field("log_json", &self.log_json)
            .field("log_dir", &self.log_dir)
            .field("background_service_failure", &self.background_service_failure)
            .field("shutdown_timeout_secs", &self.shutdown_timeout_secs)
            .finish()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}
