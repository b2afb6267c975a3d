//! Two-phase host boot as a typestate.
//!
//! `Unconfigured → ServicesConfigured → PipelineConfigured → Migrated → Running`
//!
//! Modules can only be added while `Unconfigured`, so the registry is frozen by
//! construction once pipeline configuration starts.

use crate::router::{self, ApiDocs};
use axum::Router;
use monolith_kernel::domain::config::Configuration;
use monolith_kernel::domain::environment::HostEnvironment;
use monolith_kernel::error::{StartupError, StartupErrorExt};
use monolith_kernel::hosting::lifecycle::Lifecycle;
use monolith_kernel::module::contract::{Migrate, MigrationContext, ModuleStartup};
use monolith_kernel::module::registry::{HostServices, ModuleRegistry};
use monolith_kernel::routing::catalog::{EndpointCatalog, ResolvedEndpoint};
use monolith_kernel::server::{SystemState, system_endpoints};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Version reported by `/version` and the API document.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

type PendingModule =
    Box<dyn FnOnce(&mut ModuleRegistry, &mut HostServices) -> Result<(), StartupError> + Send>;

pub struct Unconfigured {
    config: Configuration,
    pending: Vec<(String, PendingModule)>,
}

#[derive(Debug)]
pub struct ServicesConfigured {
    environment: HostEnvironment,
    registry: ModuleRegistry,
    services: HostServices,
    lifecycle: Lifecycle,
}

#[derive(Debug)]
pub struct PipelineConfigured {
    environment: HostEnvironment,
    registry: ModuleRegistry,
    services: HostServices,
    lifecycle: Lifecycle,
    endpoints: Vec<ResolvedEndpoint>,
    router: Router,
}

#[derive(Debug)]
pub struct Migrated {
    services: HostServices,
    lifecycle: Lifecycle,
    endpoints: Vec<ResolvedEndpoint>,
    router: Router,
    report: MigrationReport,
}

#[derive(Debug)]
pub struct Running {
    config: Configuration,
    lifecycle: Lifecycle,
    router: Router,
    background: Vec<JoinHandle<()>>,
}

/// The host in boot phase `P`.
#[derive(Debug)]
#[must_use = "the host does nothing until it is driven to the Running phase"]
pub struct Host<P> {
    phase: P,
}

impl fmt::Debug for Unconfigured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unconfigured")
            .field("config", &self.config)
            .field("modules", &self.pending.iter().map(|(prefix, _)| prefix).collect::<Vec<_>>())
            .finish()
    }
}

/// One executed migration.
#[derive(Debug, Clone)]
pub struct MigrationStep {
    pub module: String,
    pub started: Instant,
    pub finished: Instant,
}

impl MigrationStep {
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.finished.saturating_duration_since(self.started)
    }
}

/// Migrations in the order they ran.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    pub steps: Vec<MigrationStep>,
}

impl Host<Unconfigured> {
    pub fn new(config: Configuration) -> Self {
        Self { phase: Unconfigured { config, pending: Vec::new() } }
    }

    pub fn config(mut self, config: Configuration) -> Self {
        self.phase.config = config;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.phase.config = self.phase.config.with_port(port);
        self
    }

    /// Queues a module. It is constructed during
    /// [`configure_services`](Self::configure_services), in the order added.
    pub fn add_module<T, F>(mut self, route_prefix: impl Into<String>, factory: F) -> Self
    where
        T: ModuleStartup,
        F: FnOnce() -> T + Send + 'static,
    {
        let prefix = route_prefix.into();
        let queued = prefix.clone();
        self.phase.pending.push((
            queued,
            Box::new(move |registry: &mut ModuleRegistry, services: &mut HostServices| {
                registry.register(prefix, factory, services).map(|_| ())
            }),
        ));
        self
    }

    /// Queues a module that also runs a migration during [`Host::migrate`].
    pub fn add_migratable_module<T, F>(mut self, route_prefix: impl Into<String>, factory: F) -> Self
    where
        T: ModuleStartup + Migrate,
        F: FnOnce() -> T + Send + 'static,
    {
        let prefix = route_prefix.into();
        let queued = prefix.clone();
        self.phase.pending.push((
            queued,
            Box::new(move |registry: &mut ModuleRegistry, services: &mut HostServices| {
                registry.register_migratable(prefix, factory, services).map(|_| ())
            }),
        ));
        self
    }

    /// Phase one: registers host services, then every module's own services.
    ///
    /// # Errors
    /// The first registration failure; later modules are not constructed.
    pub fn configure_services(self) -> Result<Host<ServicesConfigured>, StartupError> {
        let Unconfigured { config, pending } = self.phase;
        let environment = HostEnvironment::from_config(&config, VERSION);

        info!(
            app = environment.application,
            version = environment.version,
            environment = %environment.name,
            content_root = %environment.content_root.display(),
            "Configuring services"
        );

        let lifecycle = Lifecycle::new();
        let mut services = HostServices::new(config, environment.clone());
        let mut registry = ModuleRegistry::new();

        for (_, register) in pending {
            register(&mut registry, &mut services)?;
        }

        info!(
            modules = registry.len(),
            hosted_services = services.hosted.len(),
            "Services configured"
        );

        Ok(Host { phase: ServicesConfigured { environment, registry, services, lifecycle } })
    }
}

impl Host<ServicesConfigured> {
    #[must_use]
    pub const fn registry(&self) -> &ModuleRegistry {
        &self.phase.registry
    }

    /// Phase two: builds the shared pipeline, then lets each module append its segment
    /// in registration order.
    ///
    /// # Errors
    /// Routing diagnostics (unresolved placeholders, conflicts) and module pipeline failures.
    pub fn configure_pipeline(self) -> Result<Host<PipelineConfigured>, StartupError> {
        let ServicesConfigured { environment, registry, services, lifecycle } = self.phase;

        let docs = ApiDocs::default();
        let mut host = system_endpoints(SystemState {
            lifecycle: lifecycle.clone(),
            version: environment.version,
        })?;
        host.extend(router::docs_endpoints(docs.clone())?);

        let catalog = EndpointCatalog::discover(&registry, host)
            .map_err(StartupError::from)
            .context("Failed to build endpoint catalog")?;

        let endpoints: Vec<ResolvedEndpoint> = catalog.iter().cloned().collect();
        docs.publish(catalog.openapi(&environment));
        let mut app = catalog.into_router();

        for descriptor in registry.iter() {
            app = descriptor
                .startup()
                .configure(app, &environment)
                .map_err(|source| StartupError::Module {
                    module: descriptor.route_prefix().to_owned().into(),
                    source,
                    context: None,
                })
                .context("Failed to configure module pipeline")?;
        }

        let router = router::with_layers(app, &environment);

        info!(endpoints = endpoints.len(), "Pipeline configured");

        Ok(Host {
            phase: PipelineConfigured { environment, registry, services, lifecycle, endpoints, router },
        })
    }
}

impl Host<PipelineConfigured> {
    #[must_use]
    pub fn endpoints(&self) -> &[ResolvedEndpoint] {
        &self.phase.endpoints
    }

    #[must_use]
    pub fn router(&self) -> Router {
        self.phase.router.clone()
    }

    /// Runs every declared migration strictly one after another, in registration order.
    ///
    /// # Errors
    /// The first failing migration; no later migration is started and nothing is rolled back.
    pub async fn migrate(self) -> Result<Host<Migrated>, StartupError> {
        let PipelineConfigured { environment, registry, services, lifecycle, endpoints, router } =
            self.phase;

        let mut report = MigrationReport::default();

        for descriptor in registry.iter() {
            let Some(migrator) = descriptor.migrator() else {
                continue;
            };
            let module = descriptor.route_prefix();
            let ctx = MigrationContext::new(module, services.config.clone(), environment.clone());

            info!(%module, "Running migration");
            let started = Instant::now();

            migrator.migrate(&ctx).await.map_err(|source| StartupError::Migration {
                module: module.to_owned().into(),
                source,
                context: None,
            })?;

            let step = MigrationStep { module: module.to_owned(), started, finished: Instant::now() };
            info!(%module, elapsed_ms = step.elapsed().as_millis(), "Migration finished");
            report.steps.push(step);
        }

        if report.steps.is_empty() {
            info!("No module declares a migration");
        }

        Ok(Host { phase: Migrated { services, lifecycle, endpoints, router, report } })
    }
}

impl Host<Migrated> {
    #[must_use]
    pub const fn report(&self) -> &MigrationReport {
        &self.phase.report
    }

    #[must_use]
    pub fn endpoints(&self) -> &[ResolvedEndpoint] {
        &self.phase.endpoints
    }

    #[must_use]
    pub fn router(&self) -> Router {
        self.phase.router.clone()
    }

    #[must_use]
    pub const fn config(&self) -> &Configuration {
        &self.phase.services.config
    }

    /// Marks the host as running and starts background services.
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> Host<Running> {
        let Migrated { services, lifecycle, router, .. } = self.phase;
        let HostServices { config, hosted, .. } = services;

        lifecycle.set_running();
        let background = hosted.start(config.background_service_failure, &lifecycle);

        if !background.is_empty() {
            info!(count = background.len(), policy = ?config.background_service_failure, "Background services running");
        }

        Host { phase: Running { config, lifecycle, router, background } }
    }
}

impl Host<Running> {
    #[must_use]
    pub fn router(&self) -> Router {
        self.phase.router.clone()
    }

    #[must_use]
    pub const fn lifecycle(&self) -> &Lifecycle {
        &self.phase.lifecycle
    }

    #[must_use]
    pub const fn config(&self) -> &Configuration {
        &self.phase.config
    }

    /// Requests shutdown and detaches background supervisors that are still running.
    pub fn shutdown(self) -> Lifecycle {
        let Running { lifecycle, background, .. } = self.phase;
        if lifecycle.stop() {
            info!("Host stopping");
        }

        let unfinished = background.iter().filter(|handle| !handle.is_finished()).count();
        if unfinished > 0 {
            warn!(unfinished, "Background services still running at shutdown");
        }
        lifecycle
    }
}
