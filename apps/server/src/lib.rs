//! # Modular Monolith Server
//!
//! One process, one HTTP API, many independently developed modules.
//!
//! ## Example
//! ```no_run
//! use monolith_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder()
//!         .port(5000)
//!         .build()
//!         .await?
//!         .run()
//!         .await
//! }
//! ```

mod router;
pub mod startup;

pub use router::{OPENAPI_PATH, SCALAR_PATH};
pub use startup::{Host, MigrationReport, MigrationStep, VERSION};

use anyhow::{Context, Result};
use axum_server::Handle;
use monolith_kernel::domain::config::Configuration;
use monolith_kernel::hosting::lifecycle::Lifecycle;
use monolith_kernel::module::contract::{Migrate, ModuleStartup};
use startup::{Migrated, Unconfigured};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

/// A fluent builder for the [`Server`]: configuration plus the modules to host.
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug)]
pub struct ServerBuilder {
    host: Host<Unconfigured>,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self { host: Host::new(Configuration::default()) }
    }
}

impl ServerBuilder {
    pub fn config(mut self, cfg: Configuration) -> Self {
        self.host = self.host.config(cfg);
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.host = self.host.port(port);
        self
    }

    /// Hosts a module under `/{route_prefix}`.
    pub fn module<T, F>(mut self, route_prefix: impl Into<String>, factory: F) -> Self
    where
        T: ModuleStartup,
        F: FnOnce() -> T + Send + 'static,
    {
        self.host = self.host.add_module(route_prefix, factory);
        self
    }

    /// Hosts a module that also migrates its data at startup.
    pub fn migratable_module<T, F>(mut self, route_prefix: impl Into<String>, factory: F) -> Self
    where
        T: ModuleStartup + Migrate,
        F: FnOnce() -> T + Send + 'static,
    {
        self.host = self.host.add_migratable_module(route_prefix, factory);
        self
    }

    /// Boots the host up to (but not including) serving requests.
    ///
    /// # Process
    /// 1. Registers host services, then each module's services
    /// 2. Builds the shared pipeline and lets modules append their segments
    /// 3. Runs module migrations one at a time
    ///
    /// # Errors
    /// Returns the first startup failure. Nothing is retried.
    pub async fn build(self) -> Result<Server> {
        let host = self
            .host
            .configure_services()
            .context("Service registration failed")?
            .configure_pipeline()
            .context("Pipeline configuration failed")?
            .migrate()
            .await
            .context("Migrations failed")?;

        Ok(Server { host })
    }
}

/// A fully booted host, ready to serve.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    host: Host<Migrated>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    #[must_use]
    pub const fn host(&self) -> &Host<Migrated> {
        &self.host
    }

    /// Starts background services and serves until Ctrl+C, SIGTERM or a background
    /// failure under the `stop_host` policy.
    ///
    /// # Errors
    /// Returns an error if the listener cannot bind or the server fails.
    pub async fn run(self) -> Result<()> {
        let running = self.host.start();
        let cfg = running.config().clone();
        let address = SocketAddr::new(cfg.address, cfg.port);
        let grace = Duration::from_secs(cfg.shutdown_timeout_secs);

        let handle = Handle::<SocketAddr>::new();
        tokio::spawn(watch_shutdown(handle.clone(), running.lifecycle().clone(), grace));

        info!("Starting HTTP server on http://{address}");

        let served = axum_server::bind(address)
            .handle(handle)
            .serve(running.router().into_make_service())
            .await
            .context("HTTP server failed");

        running.shutdown();
        served?;

        info!("Server shutdown complete");
        Ok(())
    }
}

async fn watch_shutdown(handle: Handle<SocketAddr>, lifecycle: Lifecycle, grace: Duration) {
    tokio::select! {
        res = shutdown_signal() => match res {
            Ok(()) => info!("Shutdown signal received, starting graceful shutdown..."),
            Err(e) => error!("Error while waiting for shutdown signal: {e}"),
        },
        () = lifecycle.stopped() => info!("Host stop requested, starting graceful shutdown..."),
    }

    lifecycle.stop();
    handle.graceful_shutdown(Some(grace));
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res,
        res = terminate => res,
    }
}
