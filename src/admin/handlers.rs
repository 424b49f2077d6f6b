use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::admin::AdminState;
use crate::config::schema::ServiceConfig;
use crate::registry::service::HealthStatus;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ServiceSummary {
    pub id: String,
    pub name: String,
    pub prefix: String,
    pub base_url: String,
    pub healthy: bool,
    pub consecutive_failures: u32,
}

#[derive(Deserialize)]
pub struct HealthUpdate {
    pub status: HealthStatus,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

pub async fn list_services(State(state): State<AdminState>) -> Json<Vec<ServiceSummary>> {
    let summaries = state
        .registry
        .services()
        .into_iter()
        .map(|s| ServiceSummary {
            id: s.id.clone(),
            name: s.name.clone(),
            prefix: s.prefix.clone(),
            base_url: s.base_url.to_string(),
            healthy: s.is_healthy(),
            consecutive_failures: s.health.consecutive_failures,
        })
        .collect();

    Json(summaries)
}

pub async fn register_service(
    State(state): State<AdminState>,
    Json(config): Json<ServiceConfig>,
) -> Response {
    match state.registry.register(&config) {
        Ok(id) => (StatusCode::CREATED, Json(json!({ "id": id }))).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": e.to_string() })),
        )
            .into_response(),
    }
}

pub async fn unregister_service(
    State(state): State<AdminState>,
    Path(id): Path<String>,
) -> Response {
    if state.registry.unregister(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("no service with id {}", id) })),
        )
            .into_response()
    }
}

pub async fn update_service_health(
    State(state): State<AdminState>,
    Path(id): Path<String>,
    Json(update): Json<HealthUpdate>,
) -> Response {
    if state.registry.update_health(&id, update.status) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": format!("no service with id {}", id) })),
        )
            .into_response()
    }
}
