use super::SystemState;
use axum::extract::State;

/// Semantic version of the running build, as plain text.
pub(super) async fn version_handler(State(state): State<SystemState>) -> &'static str {
    state.version
}
