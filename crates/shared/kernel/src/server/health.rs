use super::SystemState;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use std::panic::{AssertUnwindSafe, catch_unwind};

pub const HEALTHY: &str = "🚀";
pub const UNHEALTHY: &str = "☠️";

fn no_cache() -> [(header::HeaderName, &'static str); 2] {
    [(header::CACHE_CONTROL, "no-store, no-cache, must-revalidate"), (header::PRAGMA, "no-cache")]
}

fn probe(state: &SystemState) -> bool {
    !state.lifecycle.is_stopping()
}

/// Liveness probe: `200 🚀` while the host serves, `500 ☠️` once shutdown began or when
/// the probe itself panics.
pub(super) async fn health_handler(State(state): State<SystemState>) -> impl IntoResponse {
    let healthy = catch_unwind(AssertUnwindSafe(|| probe(&state))).unwrap_or_else(|_| {
        tracing::error!("Health probe panicked");
        false
    });

    if healthy {
        (StatusCode::OK, no_cache(), HEALTHY)
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, no_cache(), UNHEALTHY)
    }
}
