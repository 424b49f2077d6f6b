//! Admin surface: runtime registry mutations for operator collaborators.
//!
//! Served on its own listener, guarded by a static bearer API key. These
//! endpoints are the only way the routing table changes after startup, and
//! none of it survives a restart.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{delete, get, put},
    Router,
};
use std::sync::Arc;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::registry::table::ServiceRegistry;

/// State shared by the admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub registry: Arc<ServiceRegistry>,
    pub api_key: String,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/services", get(list_services).post(register_service))
        .route("/admin/services/{id}", delete(unregister_service))
        .route("/admin/services/{id}/health", put(update_service_health))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .with_state(state)
}
