//! Collects every declared endpoint and turns the set into a router and an API document.

use crate::domain::constants::{MODULE_ROUTE_KEY, SYSTEM_TAG};
use crate::domain::environment::HostEnvironment;
use crate::error::{RoutingError, RoutingErrorExt};
use crate::module::descriptor::ModuleOrigin;
use crate::module::registry::ModuleRegistry;
use crate::routing::convention::ModuleRoutingConvention;
use crate::routing::endpoint::Endpoint;
use axum::Router;
use axum::http::Method;
use axum::routing::MethodRouter;
use fxhash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};
use utoipa::openapi::path::{HttpMethod, OperationBuilder, PathItem, PathItemBuilder};
use utoipa::openapi::response::{ResponseBuilder, ResponsesBuilder};
use utoipa::openapi::{InfoBuilder, OpenApi, OpenApiBuilder, PathsBuilder};

/// Endpoint after the routing convention ran and its template was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub origin: ModuleOrigin,
    /// Route prefix of the owning module; `None` for host endpoints.
    pub owner: Option<String>,
    pub name: String,
    pub method: Method,
    pub path: String,
    pub route_values: BTreeMap<&'static str, String>,
}

/// All endpoints of the host, in discovery order: host endpoints first, then each
/// module's in registration order.
#[derive(Default)]
pub struct EndpointCatalog {
    entries: Vec<(ResolvedEndpoint, MethodRouter)>,
}

impl fmt::Debug for EndpointCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl EndpointCatalog {
    /// Gathers `host` endpoints plus every module's declared endpoints, applies the
    /// routing convention and resolves their paths.
    ///
    /// # Errors
    /// * Any declaration error returned by a module's `endpoints()`.
    /// * [`RoutingError::InvalidTemplate`] / [`RoutingError::UnresolvedRouteValue`] for
    ///   templates that cannot be resolved.
    /// * [`RoutingError::Conflict`] when two endpoints share a method and path.
    pub fn discover(registry: &ModuleRegistry, host: Vec<Endpoint>) -> Result<Self, RoutingError> {
        let convention = ModuleRoutingConvention::new(registry);
        let mut catalog = Self::default();
        let mut seen: FxHashMap<(Method, String), String> = FxHashMap::default();

        for endpoint in host {
            catalog.push(&convention, endpoint, &mut seen)?;
        }

        for descriptor in registry.iter() {
            let prefix = descriptor.route_prefix();
            let endpoints = descriptor
                .startup()
                .endpoints()
                .context(format!("Declaring endpoints of module '{prefix}'"))?;

            if endpoints.is_empty() {
                warn!(module = %prefix, "Module declares no endpoints");
            }

            for endpoint in endpoints {
                if endpoint.origin() != descriptor.origin() {
                    warn!(
                        module = %prefix,
                        endpoint = endpoint.name(),
                        origin = endpoint.origin().name(),
                        "Endpoint declared for another origin"
                    );
                }
                if !endpoint.template().contains(&format!("{{{MODULE_ROUTE_KEY}}}")) {
                    warn!(
                        module = %prefix,
                        endpoint = endpoint.name(),
                        template = endpoint.template(),
                        "Module endpoint is not scoped under its route prefix"
                    );
                }
                catalog
                    .push(&convention, endpoint, &mut seen)
                    .context(format!("Resolving endpoints of module '{prefix}'"))?;
            }
        }

        Ok(catalog)
    }

    fn push(
        &mut self,
        convention: &ModuleRoutingConvention,
        mut endpoint: Endpoint,
        seen: &mut FxHashMap<(Method, String), String>,
    ) -> Result<(), RoutingError> {
        convention.apply(&mut endpoint);
        let path = endpoint.resolve_path()?;

        let key = (endpoint.method().clone(), path.clone());
        if let Some(first) = seen.get(&key) {
            return Err(RoutingError::Conflict {
                method: key.0,
                path,
                first: first.clone().into(),
                second: endpoint.name().to_owned().into(),
                context: None,
            });
        }
        seen.insert(key, endpoint.name().to_owned());

        let resolved = ResolvedEndpoint {
            origin: endpoint.origin(),
            owner: convention.prefix_of(endpoint.origin()).map(str::to_owned),
            name: endpoint.name().to_owned(),
            method: endpoint.method().clone(),
            path,
            route_values: endpoint.route_values().clone(),
        };

        debug!(
            endpoint = %resolved.name,
            method = %resolved.method,
            path = %resolved.path,
            owner = resolved.owner.as_deref().unwrap_or("host"),
            "Endpoint resolved"
        );

        self.entries.push((resolved, endpoint.into_handler()));
        Ok(())
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &ResolvedEndpoint> {
        self.entries.iter().map(|(resolved, _)| resolved)
    }

    /// Endpoints owned by the module registered under `prefix`.
    pub fn owned_by<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a ResolvedEndpoint> {
        self.iter().filter(move |e| e.owner.as_deref() == Some(prefix))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Describes every resolved endpoint. Operations are tagged with the owning
    /// module's prefix, host endpoints with the system tag.
    #[must_use]
    pub fn openapi(&self, env: &HostEnvironment) -> OpenApi {
        let mut items: BTreeMap<&str, PathItemBuilder> = BTreeMap::new();

        for resolved in self.iter() {
            let Some(http_method) = http_method(&resolved.method) else {
                continue;
            };

            let operation = OperationBuilder::new()
                .operation_id(Some(resolved.name.clone()))
                .tag(resolved.owner.as_deref().unwrap_or(SYSTEM_TAG))
                .responses(
                    ResponsesBuilder::new()
                        .response("200", ResponseBuilder::new().description("Success").build())
                        .build(),
                )
                .build();

            let builder = items.remove(resolved.path.as_str()).unwrap_or_default();
            items.insert(&resolved.path, builder.operation(http_method, operation));
        }

        let paths = items
            .into_iter()
            .fold(PathsBuilder::new(), |paths, (path, item)| {
                let item: PathItem = item.build();
                paths.path(path, item)
            })
            .build();

        OpenApiBuilder::new()
            .info(InfoBuilder::new().title(env.application).version(env.version).build())
            .paths(paths)
            .build()
    }

    /// Builds the router serving every endpoint. Endpoints sharing a path are merged
    /// into one method router.
    #[must_use]
    pub fn into_router(self) -> Router {
        let mut by_path: BTreeMap<String, Vec<MethodRouter>> = BTreeMap::new();

        for (resolved, handler) in self.entries {
            by_path.entry(resolved.path).or_default().push(handler);
        }

        by_path.into_iter().fold(Router::new(), |router, (path, handlers)| {
            match handlers.into_iter().reduce(MethodRouter::merge) {
                Some(handler) => router.route(&path, handler),
                None => router,
            }
        })
    }
}

fn http_method(method: &Method) -> Option<HttpMethod> {
    Some(match *method {
        Method::GET => HttpMethod::Get,
        Method::POST => HttpMethod::Post,
        Method::PUT => HttpMethod::Put,
        Method::DELETE => HttpMethod::Delete,
        Method::PATCH => HttpMethod::Patch,
        Method::HEAD => HttpMethod::Head,
        Method::OPTIONS => HttpMethod::Options,
        Method::TRACE => HttpMethod::Trace,
        _ => return None,
    })
}
