//! Contracts a business module implements to plug into the host.

use crate::domain::config::Configuration;
use crate::domain::environment::HostEnvironment;
use crate::error::{ModuleError, RoutingError};
use crate::hosting::background::HostedServices;
use crate::hosting::lifecycle::Lifecycle;
use crate::routing::endpoint::Endpoint;
use async_trait::async_trait;
use axum::Router;
use std::borrow::Cow;
use std::fmt::Debug;

/// Startup contract every module implements.
///
/// The host drives the hooks in two phases: all modules register their services
/// ([`configure_services`](Self::configure_services)) before any of them contributes
/// endpoints or a pipeline segment. A module keeps its dependencies inside `self` and
/// passes them to its handlers as axum state; nothing is shared with other modules.
pub trait ModuleStartup: Debug + Send + Sync + 'static {
    /// Builds the module's private dependencies and background services.
    ///
    /// # Errors
    /// Any error aborts host startup.
    fn configure_services(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError>;

    /// Declares the module's HTTP endpoints.
    ///
    /// Templates use the `{module}` placeholder, which the host replaces with the
    /// module's route prefix.
    ///
    /// # Errors
    /// Returns a [`RoutingError`] for malformed declarations.
    fn endpoints(&self) -> Result<Vec<Endpoint>, RoutingError>;

    /// Appends the module's segment to the shared pipeline, e.g. a layer or extra routes.
    /// Runs after the shared pipeline is built, in registration order.
    ///
    /// # Errors
    /// Any error aborts host startup.
    fn configure(&self, app: Router, env: &HostEnvironment) -> Result<Router, ModuleError> {
        let _ = env;
        Ok(app)
    }
}

/// Optional capability: a data migration run once at startup.
///
/// Migrations of all modules run one at a time in registration order; the first
/// failure stops the sequence.
#[async_trait]
pub trait Migrate: Send + Sync + 'static {
    async fn migrate(&self, ctx: &MigrationContext) -> Result<(), ModuleError>;
}

/// Per-module view of the host while services are registered.
#[derive(Debug)]
pub struct ModuleContext<'a> {
    prefix: &'a str,
    config: &'a Configuration,
    environment: &'a HostEnvironment,
    hosted: &'a mut HostedServices,
}

impl<'a> ModuleContext<'a> {
    pub(crate) const fn new(
        prefix: &'a str,
        config: &'a Configuration,
        environment: &'a HostEnvironment,
        hosted: &'a mut HostedServices,
    ) -> Self {
        Self { prefix, config, environment, hosted }
    }

    /// The module's own route prefix.
    #[must_use]
    pub const fn prefix(&self) -> &str {
        self.prefix
    }

    #[must_use]
    pub const fn config(&self) -> &Configuration {
        self.config
    }

    #[must_use]
    pub const fn environment(&self) -> &HostEnvironment {
        self.environment
    }

    /// Registers a background worker owned by this module. It starts when the host runs.
    pub fn hosted_service<F, Fut>(&mut self, name: impl Into<Cow<'static, str>>, factory: F)
    where
        F: FnOnce(Lifecycle) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ModuleError>> + Send + 'static,
    {
        self.hosted.add(self.prefix.to_owned(), name, factory);
    }
}

/// What a migration step can see.
#[derive(Debug, Clone)]
pub struct MigrationContext {
    prefix: String,
    config: Configuration,
    environment: HostEnvironment,
}

impl MigrationContext {
    #[must_use]
    pub fn new(prefix: impl Into<String>, config: Configuration, environment: HostEnvironment) -> Self {
        Self { prefix: prefix.into(), config, environment }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub const fn config(&self) -> &Configuration {
        &self.config
    }

    /// The datastore DSN, if one is configured.
    #[must_use]
    pub fn connection_string(&self) -> Option<&str> {
        self.config.db_connection_string.as_deref()
    }

    #[must_use]
    pub const fn environment(&self) -> &HostEnvironment {
        &self.environment
    }
}
