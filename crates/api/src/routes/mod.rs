pub mod health;
pub mod interactions;

use axum::Router;
use tower_http::trace::TraceLayer;

use relay_common::types::QueueKind;

use crate::state::AppState;

/// Build the router for the bound queue kind.
///
/// Team-chat processes expose only the interaction webhook; every other
/// process exposes only the liveness endpoints.
pub fn create_router(state: AppState) -> Router {
    let routes = match state.config.queue_kind {
        QueueKind::TeamChat => interactions::router(),
        QueueKind::InstantMessage | QueueKind::Email => health::router(),
    };

    routes.with_state(state).layer(TraceLayer::new_for_http())
}
