//! Endpoints the host serves on its own, outside any module.

pub mod health;
pub mod version;

use crate::error::RoutingError;
use crate::hosting::lifecycle::Lifecycle;
use crate::routing::endpoint::{Endpoint, Endpoints};

/// Origin marker for host-native endpoints. Never registered as a module, so the
/// routing convention leaves these endpoints alone.
#[derive(Debug)]
pub struct SystemEndpoints;

/// State shared by the system endpoints.
#[derive(Debug, Clone)]
pub struct SystemState {
    pub lifecycle: Lifecycle,
    pub version: &'static str,
}

/// `GET /health` and `GET /version`.
///
/// # Errors
/// Only fails if the declarations themselves are malformed.
pub fn system_endpoints(state: SystemState) -> Result<Vec<Endpoint>, RoutingError> {
    Endpoints::of::<SystemEndpoints>()
        .with_state(state)
        .get("health", "/health", health::health_handler)
        .get("version", "/version", version::version_handler)
        .build()
}
