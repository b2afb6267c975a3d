use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use monolith_kernel::domain::environment::HostEnvironment;
use monolith_kernel::error::RoutingError;
use monolith_kernel::routing::endpoint::{Endpoint, Endpoints};
use monolith_kernel::server::SystemEndpoints;
use std::any::Any;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::trace::TraceLayer;
use tracing::{Span, error, info, info_span, warn};
use utoipa::openapi::OpenApi;
use utoipa_scalar::Scalar;

pub const OPENAPI_PATH: &str = "/openapi/v1.json";
pub const SCALAR_PATH: &str = "/scalar";
const HEALTH_PATH: &str = "/health";

/// API document shared by the docs endpoints. It is published once the endpoint
/// catalog, which includes the docs endpoints themselves, has been resolved.
#[derive(Debug, Clone, Default)]
pub(crate) struct ApiDocs {
    doc: Arc<OnceLock<OpenApi>>,
}

impl ApiDocs {
    pub(crate) fn publish(&self, doc: OpenApi) {
        if self.doc.set(doc).is_err() {
            warn!("API document already published");
        }
    }
}

async fn openapi_json(State(docs): State<ApiDocs>) -> Response {
    match docs.doc.get() {
        Some(doc) => Json(doc.clone()).into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

async fn scalar_ui(State(docs): State<ApiDocs>) -> Response {
    match docs.doc.get() {
        Some(doc) => Html(Scalar::new(doc.clone()).to_html()).into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

/// The API document and the Scalar UI, declared as host endpoints so module routes
/// are checked against them.
pub(crate) fn docs_endpoints(docs: ApiDocs) -> Result<Vec<Endpoint>, RoutingError> {
    Endpoints::of::<SystemEndpoints>()
        .with_state(docs)
        .get("openapi-document", OPENAPI_PATH, openapi_json)
        .get("scalar-ui", SCALAR_PATH, scalar_ui)
        .build()
}

/// Outermost layers shared by every module: request tracing (health probes excluded)
/// and panic recovery.
pub(crate) fn with_layers(app: Router, env: &HostEnvironment) -> Router {
    let developer_details = env.is_development();

    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            if request.uri().path().starts_with(HEALTH_PATH) {
                Span::none()
            } else {
                info_span!("request", method = %request.method(), uri = %request.uri())
            }
        })
        .on_request(())
        .on_response(|response: &Response, latency: Duration, span: &Span| {
            if !span.is_disabled() {
                info!(parent: span, status = response.status().as_u16(), latency_ms = latency.as_millis(), "Request finished");
            }
        })
        .on_failure(|failure: ServerErrorsFailureClass, latency: Duration, span: &Span| {
            if !span.is_disabled() {
                error!(parent: span, %failure, latency_ms = latency.as_millis(), "Request failed");
            }
        });

    app.layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
        panic_response(panic, developer_details)
    }))
        .layer(trace)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>, developer_details: bool) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| (*s).to_owned()))
        .unwrap_or_else(|| "unknown panic payload".to_owned());

    error!(panic = %message, "Request handler panicked");

    let body = if developer_details {
        format!("Internal Server Error: {message}")
    } else {
        "Internal Server Error".to_owned()
    };

    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}
