use crate::handlers;
use crate::middleware::{auth_middleware, AuthConfig};
use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use switchyard_fabric::RoutingFabric;
use switchyard_vector::VectorService;
use tracing::info;

/// Default mount point of the vector bus routes.
pub const DEFAULT_PREFIX: &str = "/v1";

/// Shared application state.
pub struct AppState {
    pub fabric: Arc<RoutingFabric>,
    pub vectors: Arc<dyn VectorService>,
}

/// The HTTP gateway.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the gateway without auth, vector routes under [`DEFAULT_PREFIX`].
    pub fn build(state: Arc<AppState>) -> Router {
        Self::build_with_auth(state, DEFAULT_PREFIX, AuthConfig::default())
    }

    /// Build the gateway with the vector routes under `prefix` and bearer
    /// auth on every route except the health check.
    pub fn build_with_auth(state: Arc<AppState>, prefix: &str, auth: AuthConfig) -> Router {
        let vectors = Router::new()
            .route("/embed", post(handlers::embed))
            .route("/vectors", post(handlers::upsert))
            .route("/query", post(handlers::query))
            .route("/dot", post(handlers::dot));

        let protected = mount(prefix, vectors)
            .route("/route", post(handlers::route))
            .route("/agents", get(handlers::agents));

        let protected = if auth.is_enabled() {
            info!(keys = auth.api_keys.len(), "Gateway: API key auth enabled");
            protected.layer(axum_mw::from_fn_with_state(Arc::new(auth), auth_middleware))
        } else {
            protected
        };

        let health = mount(prefix, Router::new().route("/healthz", get(handlers::healthz)));

        protected.merge(health).with_state(state)
    }
}

/// Nest `routes` under `prefix`; an empty or `/` prefix mounts at the root.
fn mount(prefix: &str, routes: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        Router::new().merge(routes)
    } else if prefix.starts_with('/') {
        Router::new().nest(prefix, routes)
    } else {
        Router::new().nest(&format!("/{prefix}"), routes)
    }
}
