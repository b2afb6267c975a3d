//! Everything a module author needs in one import.

pub use crate::domain::config::Configuration;
pub use crate::domain::environment::HostEnvironment;
pub use crate::error::{ModuleError, ModuleErrorExt, RoutingError, StartupError};
pub use crate::hosting::lifecycle::{HostPhase, Lifecycle};
pub use crate::module::contract::{Migrate, MigrationContext, ModuleContext, ModuleStartup};
pub use crate::routing::endpoint::{Endpoint, Endpoints};
pub use async_trait::async_trait;
pub use axum::Router;
pub use axum::extract::State;
