use crate::actors::RelayActorHandle;
use crate::observability::{health_router, HealthState};
use crate::transport::{ws_handler, WsState};
use axum::{routing::get, Router};
use std::sync::Arc;
use token_service::TokenService;
use tower_http::trace::TraceLayer;

/// Everything the HTTP router needs.
#[derive(Clone)]
pub struct AppState {
    pub relay: RelayActorHandle,
    pub tokens: Arc<TokenService>,
    pub health: Arc<HealthState>,
    pub require_token: bool,
}

/// Build the server router: `/ws`, the token API and health checks.
///
/// `/metrics` is merged in by the binary, which owns the exporter handle.
pub fn build_routes(state: AppState) -> Router {
    let ws_state = WsState {
        relay: state.relay,
        tokens: Arc::clone(&state.tokens),
        require_token: state.require_token,
    };

    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(ws_state)
        .merge(token_service::routes::build_routes(state.tokens))
        .merge(health_router(state.health))
        .layer(TraceLayer::new_for_http())
}
