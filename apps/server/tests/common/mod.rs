#![allow(dead_code, unreachable_pub)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use monolith_kernel::domain::config::{Configuration, ConfigurationInner};
use monolith_kernel::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tower::ServiceExt;

pub fn development() -> Configuration {
    Configuration::new(ConfigurationInner {
        environment: "Development".to_owned(),
        ..ConfigurationInner::default()
    })
}

pub async fn send(router: Router, method: &str, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().method(method).uri(uri).body(Body::empty()).expect("request");
    let response = router.oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub async fn get(router: Router, uri: &str) -> (StatusCode, String) {
    send(router, "GET", uri).await
}

/// Echoes the prefix it was registered under. `N` makes distinct module types.
#[derive(Debug, Default)]
pub struct Echo<const N: usize> {
    prefix: String,
}

async fn whoami(State(prefix): State<String>) -> String {
    prefix
}

impl<const N: usize> ModuleStartup for Echo<N> {
    fn configure_services(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        self.prefix = ctx.prefix().to_owned();
        Ok(())
    }

    fn endpoints(&self) -> Result<Vec<Endpoint>, RoutingError> {
        Endpoints::of::<Self>()
            .with_state(self.prefix.clone())
            .get("whoami", "/{module}/whoami", whoami)
            .build()
    }
}

/// Declares an endpoint on behalf of a type that is never registered.
#[derive(Debug)]
pub struct Impostor;

struct NotAModule;

async fn nothing() -> &'static str {
    ""
}

impl ModuleStartup for Impostor {
    fn configure_services(&mut self, _: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }

    fn endpoints(&self) -> Result<Vec<Endpoint>, RoutingError> {
        Endpoints::of::<NotAModule>().get("orphan", "/{module}/orphan", nothing).build()
    }
}

/// Shared record of migration activity across modules.
#[derive(Debug, Default)]
pub struct MigrationTracker {
    pub order: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

/// Migratable module; fails its migration when `fail` is set.
#[derive(Debug)]
pub struct Migrating<const N: usize> {
    pub tracker: Arc<MigrationTracker>,
    pub fail: bool,
}

impl<const N: usize> ModuleStartup for Migrating<N> {
    fn configure_services(&mut self, _: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }

    fn endpoints(&self) -> Result<Vec<Endpoint>, RoutingError> {
        Endpoints::of::<Self>().get("status", "/{module}/status", nothing).build()
    }
}

#[async_trait]
impl<const N: usize> Migrate for Migrating<N> {
    async fn migrate(&self, ctx: &MigrationContext) -> Result<(), ModuleError> {
        let now = self.tracker.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.tracker.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(15)).await;
        self.tracker.order.lock().await.push(ctx.prefix().to_owned());

        self.tracker.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            Err(ModuleError::Migration { message: "schema locked".into(), context: None })
        } else {
            Ok(())
        }
    }
}
