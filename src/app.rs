//! Router assembly.
//!
//! Everything the gateway serves is described by one [`GatewayConfig`], built once at
//! start-up and turned into an axum [`Router`]. There is no global schema or server.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::get,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers,
    middleware,
    services::{engine::ExecutionEngine, gate::AuthGate},
};

/// Public liveness route; the GraphQL path may not reuse it.
pub const HEALTH_PATH: &str = "/health";

/// Shared state handed to the gate middleware and the GraphQL handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn ExecutionEngine>,
    pub gate: Arc<AuthGate>,
}

/// Static wiring of the gateway.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Engine that executes allowed requests
    pub engine: Arc<dyn ExecutionEngine>,

    /// Gate every GraphQL request passes through
    pub gate: Arc<AuthGate>,

    /// Path the GraphQL endpoint is mounted on, e.g. `/graphql`
    pub path: String,
}

/// Build the HTTP router.
///
/// # Routes
///
/// - `GET /health` - public
/// - `GET {path}`, `POST {path}` - behind the authorization gate
pub fn router(config: GatewayConfig) -> Router {
    let state = AppState {
        engine: config.engine,
        gate: config.gate,
    };

    // Gated GraphQL routes
    let graphql_routes = Router::new()
        .route(
            &config.path,
            get(handlers::graphql::execute_get).post(handlers::graphql::execute_post),
        )
        // route_layer so unmatched paths return 404 without asking for a key
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::gate_middleware,
        ));

    Router::new()
        // Public routes (no API key required)
        .route(HEALTH_PATH, get(handlers::health::health_check))
        .merge(graphql_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
