use crate::handlers::token_handler;
use crate::services::TokenService;
use axum::{routing::post, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Token HTTP API. Mounted by the relay server next to `/ws`.
pub fn build_routes(service: Arc<TokenService>) -> Router {
    Router::new()
        .route("/token", post(token_handler::handle_issue_token))
        .route("/token/validate", post(token_handler::handle_validate_token))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
