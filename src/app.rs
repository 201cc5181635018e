use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::AuthGate;
use crate::config::AppConfig;
use crate::engine::CrudEngine;
use crate::handlers::{auth, resource, system};
use crate::middleware::jwt_auth_middleware;
use crate::store::TableStore;

/// Shared per-process state; each request borrows the store handle from here
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TableStore>,
    pub auth: AuthGate,
    pub admin_role: String,
    pub hash_cost: u32,
}

impl AppState {
    pub fn new(store: Arc<dyn TableStore>, config: &AppConfig) -> Self {
        Self {
            store,
            auth: AuthGate::from_config(&config.security),
            admin_role: config.security.admin_role.clone(),
            hash_cost: config.security.bcrypt_cost,
        }
    }

    pub fn engine(&self) -> CrudEngine<'_> {
        CrudEngine::new(self.store.as_ref()).with_hash_cost(self.hash_cost)
    }
}

pub fn app(state: AppState, enable_cors: bool) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/login", post(auth::login).fallback(system::fallback))
        // Role-gated
        .merge(admin_routes(state.clone()))
        // Registry-driven CRUD for every resource
        .merge(resource_routes())
        .fallback(system::fallback)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin", get(auth::admin).fallback(system::fallback))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn resource_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/:resource",
            get(resource::list).post(resource::create).fallback(system::fallback),
        )
        .route(
            "/:resource/:id",
            put(resource::update).delete(resource::delete).fallback(system::fallback),
        )
}
