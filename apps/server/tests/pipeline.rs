mod common;

use axum::http::StatusCode;
use axum::http::header::HeaderValue;
use axum::response::Response;
use common::{Echo, development, get};
use monolith_kernel::domain::config::{BackgroundFailurePolicy, Configuration, ConfigurationInner};
use monolith_kernel::prelude::*;
use monolith_server::{Host, OPENAPI_PATH, SCALAR_PATH, VERSION};
use std::time::Duration;

#[tokio::test]
async fn health_and_version_are_served() {
    let host = Host::new(Configuration::default())
        .configure_services()
        .expect("services")
        .configure_pipeline()
        .expect("pipeline")
        .migrate()
        .await
        .expect("migrate")
        .start();

    let (status, body) = get(host.router(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "🚀");

    let (status, body) = get(host.router(), "/version").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.is_empty());
    assert_eq!(body, VERSION);
}

#[tokio::test]
async fn health_fails_after_shutdown_request() {
    let host = Host::new(Configuration::default())
        .configure_services()
        .expect("services")
        .configure_pipeline()
        .expect("pipeline")
        .migrate()
        .await
        .expect("migrate")
        .start();

    let router = host.router();
    let lifecycle = host.shutdown();
    assert_eq!(lifecycle.phase(), HostPhase::Stopping);

    let (status, body) = get(router, "/health").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "☠️");
}

#[tokio::test]
async fn api_document_lists_module_and_system_paths() {
    let host = Host::new(Configuration::default())
        .add_module("artists", Echo::<1>::default)
        .configure_services()
        .expect("services")
        .configure_pipeline()
        .expect("pipeline");

    let (status, body) = get(host.router(), OPENAPI_PATH).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("/artists/whoami"));
    assert!(body.contains("/health"));
    assert!(body.contains("ModularMonolith"));

    let (status, _) = get(host.router(), SCALAR_PATH).await;
    assert_eq!(status, StatusCode::OK);
}

#[derive(Debug)]
struct Explosive;

async fn explode() -> &'static str {
    panic!("flux capacitor overloaded")
}

impl ModuleStartup for Explosive {
    fn configure_services(&mut self, _: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }

    fn endpoints(&self) -> Result<Vec<Endpoint>, RoutingError> {
        Endpoints::of::<Self>().get("explode", "/{module}/explode", explode).build()
    }
}

#[tokio::test]
async fn panics_become_500_with_details_in_development() {
    let host = Host::new(development())
        .add_module("lab", || Explosive)
        .configure_services()
        .expect("services")
        .configure_pipeline()
        .expect("pipeline");

    let (status, body) = get(host.router(), "/lab/explode").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("flux capacitor overloaded"));
}

#[tokio::test]
async fn panic_details_are_hidden_outside_development() {
    let host = Host::new(Configuration::default())
        .add_module("lab", || Explosive)
        .configure_services()
        .expect("services")
        .configure_pipeline()
        .expect("pipeline");

    let (status, body) = get(host.router(), "/lab/explode").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("flux capacitor"));
}

/// Pipeline segment that appends its prefix to `x-segments` and stamps the environment.
#[derive(Debug, Default)]
struct Stamp<const N: usize> {
    prefix: String,
}

impl<const N: usize> ModuleStartup for Stamp<N> {
    fn configure_services(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        self.prefix = ctx.prefix().to_owned();
        Ok(())
    }

    fn endpoints(&self) -> Result<Vec<Endpoint>, RoutingError> {
        Ok(Vec::new())
    }

    fn configure(&self, app: Router, env: &HostEnvironment) -> Result<Router, ModuleError> {
        let segment = HeaderValue::from_str(&self.prefix).map_err(ModuleError::source)?;
        let environment = HeaderValue::from_str(&env.name).map_err(ModuleError::source)?;
        Ok(app.layer(axum::middleware::map_response(move |mut response: Response| {
            let segment = segment.clone();
            let environment = environment.clone();
            async move {
                // Inner layers see the response first, so earlier segments append first.
                response.headers_mut().append("x-segments", segment);
                response.headers_mut().insert("x-environment", environment);
                response
            }
        })))
    }
}

async fn whoami_headers(router: Router) -> axum::http::HeaderMap {
    let response = tower::ServiceExt::oneshot(
        router,
        axum::http::Request::get("/artists/whoami").body(axum::body::Body::empty()).expect("request"),
    )
    .await
    .expect("response");
    response.headers().clone()
}

#[tokio::test]
async fn module_pipeline_segment_is_applied() {
    let host = Host::new(development())
        .add_module("artists", Echo::<1>::default)
        .add_module("stamp", Stamp::<1>::default)
        .configure_services()
        .expect("services")
        .configure_pipeline()
        .expect("pipeline");

    let headers = whoami_headers(host.router()).await;
    assert_eq!(headers.get("x-environment").map(HeaderValue::as_bytes), Some(&b"Development"[..]));
}

#[tokio::test]
async fn pipeline_segments_follow_registration_order() {
    let host = Host::new(development())
        .add_module("first", Stamp::<1>::default)
        .add_module("artists", Echo::<1>::default)
        .add_module("second", Stamp::<2>::default)
        .add_module("third", Stamp::<3>::default)
        .configure_services()
        .expect("services")
        .configure_pipeline()
        .expect("pipeline");

    let headers = whoami_headers(host.router()).await;
    let segments: Vec<_> = headers
        .get_all("x-segments")
        .iter()
        .map(|v| v.to_str().expect("ascii").to_owned())
        .collect();
    assert_eq!(segments, ["first", "second", "third"]);
}

/// Claims paths the host already serves for its API documentation.
#[derive(Debug)]
struct Squatter<const N: usize>;

async fn squat() -> &'static str {
    "mine"
}

impl ModuleStartup for Squatter<1> {
    fn configure_services(&mut self, _: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }

    fn endpoints(&self) -> Result<Vec<Endpoint>, RoutingError> {
        Endpoints::of::<Self>().get("document", "/{module}/v1.json", squat).build()
    }
}

impl ModuleStartup for Squatter<2> {
    fn configure_services(&mut self, _: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }

    fn endpoints(&self) -> Result<Vec<Endpoint>, RoutingError> {
        Endpoints::of::<Self>().get("landing", "/{module}", squat).build()
    }
}

fn docs_conflict(err: &StartupError) -> Option<(&str, &str)> {
    match err {
        StartupError::Routing { source: RoutingError::Conflict { path, first, .. }, .. } => {
            Some((path.as_str(), first.as_ref()))
        },
        _ => None,
    }
}

#[test]
fn module_route_on_api_document_path_is_a_conflict() {
    let err = Host::new(Configuration::default())
        .add_module("openapi", || Squatter::<1>)
        .configure_services()
        .expect("services")
        .configure_pipeline()
        .expect_err("conflict with the API document");

    assert_eq!(docs_conflict(&err), Some((OPENAPI_PATH, "openapi-document")), "{err}");
}

#[test]
fn module_route_on_scalar_path_is_a_conflict() {
    let err = Host::new(Configuration::default())
        .add_module("scalar", || Squatter::<2>)
        .configure_services()
        .expect("services")
        .configure_pipeline()
        .expect_err("conflict with the Scalar UI");

    assert_eq!(docs_conflict(&err), Some((SCALAR_PATH, "scalar-ui")), "{err}");
}

/// Registers a background worker that fails straight away.
#[derive(Debug)]
struct Flaky;

impl ModuleStartup for Flaky {
    fn configure_services(&mut self, ctx: &mut ModuleContext<'_>) -> Result<(), ModuleError> {
        ctx.hosted_service("sync", |_| async { Err(ModuleError::from("upstream unreachable")) });
        Ok(())
    }

    fn endpoints(&self) -> Result<Vec<Endpoint>, RoutingError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn background_failure_stops_host_when_configured() {
    let config = Configuration::new(ConfigurationInner {
        background_service_failure: BackgroundFailurePolicy::StopHost,
        ..ConfigurationInner::default()
    });

    let host = Host::new(config)
        .add_module("flaky", || Flaky)
        .configure_services()
        .expect("services")
        .configure_pipeline()
        .expect("pipeline")
        .migrate()
        .await
        .expect("migrate")
        .start();

    tokio::time::timeout(Duration::from_secs(1), host.lifecycle().stopped())
        .await
        .expect("host stop requested");

    let (status, _) = get(host.router(), "/health").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn background_failure_is_ignored_by_default() {
    let host = Host::new(Configuration::default())
        .add_module("flaky", || Flaky)
        .configure_services()
        .expect("services")
        .configure_pipeline()
        .expect("pipeline")
        .migrate()
        .await
        .expect("migrate")
        .start();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(host.lifecycle().phase(), HostPhase::Running);

    let (status, body) = get(host.router(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "🚀");
}
