use crate::config::Configuration;
use crate::constants::{APP_NAME, DEVELOPMENT};
use std::path::PathBuf;

/// Description of the hosting environment handed to every module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    /// Application name.
    pub application: &'static str,
    /// Environment name (`Development`, `Production`, ...).
    pub name: String,
    /// Semantic version of the running build.
    pub version: &'static str,
    /// Directory the process was started from.
    pub content_root: PathBuf,
}

impl HostEnvironment {
    /// Builds the environment description for a build `version` from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &Configuration, version: &'static str) -> Self {
        Self {
            application: APP_NAME,
            name: config.environment.clone(),
            version,
            content_root: std::env::current_dir().unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        self.name.eq_ignore_ascii_case(DEVELOPMENT)
    }

    #[must_use]
    pub fn is_environment(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}
