use crate::domain::constants::MODULE_ROUTE_KEY;
use crate::error::RoutingError;
use crate::module::descriptor::ModuleOrigin;
use axum::handler::Handler;
use axum::http::Method;
use axum::routing::{MethodFilter, MethodRouter, on};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// One HTTP endpoint declared by a module (or by the host itself).
///
/// The template may reference route values as `{key}` placeholders; the host fills in
/// `{module}` with the owning module's prefix. Any other `{name}` is left for axum to
/// capture as a path parameter.
pub struct Endpoint {
    origin: ModuleOrigin,
    name: Cow<'static, str>,
    method: Method,
    template: Cow<'static, str>,
    route_values: BTreeMap<&'static str, String>,
    handler: MethodRouter,
}

impl Endpoint {
    #[must_use]
    pub const fn origin(&self) -> ModuleOrigin {
        self.origin
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn route_value(&self, key: &str) -> Option<&str> {
        self.route_values.get(key).map(String::as_str)
    }

    #[must_use]
    pub const fn route_values(&self) -> &BTreeMap<&'static str, String> {
        &self.route_values
    }

    /// Sets a route value, replacing any previous one.
    pub fn set_route_value(&mut self, key: &'static str, value: impl Into<String>) {
        self.route_values.insert(key, value.into());
    }

    /// Substitutes route values into the template.
    ///
    /// # Errors
    /// * [`RoutingError::InvalidTemplate`] when the template does not start with `/`.
    /// * [`RoutingError::UnresolvedRouteValue`] when `{module}` has no value.
    pub fn resolve_path(&self) -> Result<String, RoutingError> {
        if !self.template.starts_with('/') {
            return Err(RoutingError::InvalidTemplate {
                template: self.template.clone(),
                context: None,
            });
        }

        let path = self
            .route_values
            .iter()
            .fold(self.template.to_string(), |path, (key, value)| {
                path.replace(&format!("{{{key}}}"), value)
            });

        if path.contains(&format!("{{{MODULE_ROUTE_KEY}}}")) {
            return Err(RoutingError::UnresolvedRouteValue {
                endpoint: self.name.clone(),
                key: MODULE_ROUTE_KEY,
                template: self.template.clone(),
                context: None,
            });
        }

        Ok(path)
    }

    pub(crate) fn into_handler(self) -> MethodRouter {
        self.handler
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("origin", &self.origin.name())
            .field("name", &self.name)
            .field("method", &self.method)
            .field("template", &self.template)
            .field("route_values", &self.route_values)
            .finish_non_exhaustive()
    }
}

/// Builder for the endpoint list of one origin.
///
/// ```rust
/// use monolith_kernel::prelude::*;
///
/// #[derive(Debug)]
/// struct Artists;
///
/// async fn list(State(names): State<Vec<&'static str>>) -> String {
///     names.join(",")
/// }
///
/// let endpoints = Endpoints::of::<Artists>()
///     .with_state(vec!["Nina", "Miles"])
///     .get("list-artists", "/{module}/artists", list)
///     .build()
///     .unwrap();
///
/// assert_eq!(endpoints[0].template(), "/{module}/artists");
/// ```
#[must_use = "call .build() to obtain the endpoints"]
pub struct Endpoints<S = ()> {
    origin: ModuleOrigin,
    state: S,
    endpoints: Vec<Result<Endpoint, RoutingError>>,
}

impl Endpoints<()> {
    /// Starts a list whose endpoints belong to `O`, normally the module's startup type.
    pub fn of<O: ?Sized + 'static>() -> Self {
        Self { origin: ModuleOrigin::of::<O>(), state: (), endpoints: Vec::new() }
    }
}

impl<S> Endpoints<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Handlers added after this call receive `state` through [`axum::extract::State`].
    pub fn with_state<S2>(self, state: S2) -> Endpoints<S2>
    where
        S2: Clone + Send + Sync + 'static,
    {
        Endpoints { origin: self.origin, state, endpoints: self.endpoints }
    }

    pub fn route<H, T>(
        mut self,
        method: Method,
        name: impl Into<Cow<'static, str>>,
        template: impl Into<Cow<'static, str>>,
        handler: H,
    ) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        let name = name.into();
        let endpoint = match MethodFilter::try_from(method.clone()) {
            Ok(filter) => Ok(Endpoint {
                origin: self.origin,
                name,
                method,
                template: template.into(),
                route_values: BTreeMap::new(),
                handler: on(filter, handler).with_state(self.state.clone()),
            }),
            Err(_) => Err(RoutingError::UnsupportedMethod { method, endpoint: name, context: None }),
        };
        self.endpoints.push(endpoint);
        self
    }

    pub fn get<H, T>(
        self,
        name: impl Into<Cow<'static, str>>,
        template: impl Into<Cow<'static, str>>,
        handler: H,
    ) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route(Method::GET, name, template, handler)
    }

    pub fn post<H, T>(
        self,
        name: impl Into<Cow<'static, str>>,
        template: impl Into<Cow<'static, str>>,
        handler: H,
    ) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route(Method::POST, name, template, handler)
    }

    pub fn put<H, T>(
        self,
        name: impl Into<Cow<'static, str>>,
        template: impl Into<Cow<'static, str>>,
        handler: H,
    ) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route(Method::PUT, name, template, handler)
    }

    pub fn patch<H, T>(
        self,
        name: impl Into<Cow<'static, str>>,
        template: impl Into<Cow<'static, str>>,
        handler: H,
    ) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route(Method::PATCH, name, template, handler)
    }

    pub fn delete<H, T>(
        self,
        name: impl Into<Cow<'static, str>>,
        template: impl Into<Cow<'static, str>>,
        handler: H,
    ) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.route(Method::DELETE, name, template, handler)
    }

    /// # Errors
    /// Returns the first declaration error, e.g. an unsupported HTTP method.
    pub fn build(self) -> Result<Vec<Endpoint>, RoutingError> {
        self.endpoints.into_iter().collect()
    }
}

impl<S> fmt::Debug for Endpoints<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoints")
            .field("origin", &self.origin.name())
            .field("endpoints", &self.endpoints.len())
            .finish_non_exhaustive()
    }
}
