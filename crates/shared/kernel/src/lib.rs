//! Kernel shared by the Host and every module.
//! Keep this crate about composition: contracts modules implement, the registry the Host
//! builds from them, the routing convention that prefixes their endpoints and the hosting
//! primitives (lifecycle, background services) the Host runs them with.
//!
//! ## Writing a module
//! ```rust
//! use monolith_kernel::prelude::*;
//!
//! #[derive(Debug, Default)]
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! impl ModuleStartup for Greeter {
//!     fn configure_services(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
//!         self.greeting = format!("hello from {}", ctx.prefix());
//!         Ok(())
//!     }
//!
//!     fn endpoints(&self) -> Result<Vec<Endpoint>, RoutingError> {
//!         Endpoints::of::<Self>()
//!             .with_state(self.greeting.clone())
//!             .get("greet", "/{module}/hello", greet)
//!             .build()
//!     }
//! }
//!
//! async fn greet(State(greeting): State<String>) -> String {
//!     greeting
//! }
//! ```
//!
//! ## Config loading
//! ```rust,no_run
//! use monolith_kernel::config::load_configuration;
//!
//! let cfg = load_configuration().expect("configuration");
//! assert!(cfg.port > 0);
//! ```

pub mod config;
pub mod error;
pub mod hosting;
pub mod module;
pub mod prelude;
pub mod routing;
pub mod server;

pub use monolith_domain as domain;
