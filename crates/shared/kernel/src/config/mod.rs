mod dotenv;

pub use dotenv::{DotenvOutcome, seed_from_dotenv};

use crate::domain::config::{Configuration, ConfigurationInner};
use crate::domain::constants::{CONFIG_FILE, ENV_PREFIX};
use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error{}: {source}", crate::error::format_context(.context))]
    Config {
        #[source]
        source: config::ConfigError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Dotenv error{}: {source}", crate::error::format_context(.context))]
    Dotenv {
        #[source]
        source: dotenvy::Error,
        context: Option<Cow<'static, str>>,
    },
}

crate::error_context!(ConfigError => ConfigErrorExt { Config, Dotenv });

impl From<config::ConfigError> for ConfigError {
    fn from(source: config::ConfigError) -> Self {
        Self::Config { source, context: None }
    }
}

impl From<dotenvy::Error> for ConfigError {
    fn from(source: dotenvy::Error) -> Self {
        Self::Dotenv { source, context: None }
    }
}

/// Layered loader: an optional file beneath `MONOLITH_*` environment variables.
///
/// 1. **File**: `path` (extension inferred, e.g. `monolith.toml`). Missing files are skipped.
/// 2. **Environment**: `MONOLITH_<KEY>` overrides the flat field `<key>`, so
///    `MONOLITH_DB_CONNECTION_STRING` binds `db_connection_string`. Values stay strings
///    until the target field asks for a number or a boolean, so a numeric DSN is kept as text.
///
/// # Errors
/// Returns [`ConfigError::Config`] when a source is malformed or a value does not fit the
/// target type (e.g. `MONOLITH_PORT=abc`).
///
/// # Example
/// ```rust
/// use monolith_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     #[serde(default)]
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("does/not/exist")).unwrap_or_default();
/// # let _ = cfg.port;
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path =
        path.map_or_else(|| PathBuf::from(CONFIG_FILE), |p| p.as_ref().to_path_buf());

    debug!(path = %effective_path.display(), prefix = ENV_PREFIX, "Loading configuration");

    let config = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX))
        .build()
        .map_err(ConfigError::from)
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .map_err(ConfigError::from)
        .context("Failed to deserialize config")?;

    Ok(config)
}

/// Loads the process [`Configuration`] from `monolith.*` and the environment.
///
/// # Errors
/// See [`load_config`].
pub fn load_configuration() -> Result<Configuration, ConfigError> {
    load_config::<ConfigurationInner>(None::<&Path>).map(Configuration::from)
}
