//! Gateway error taxonomy.
//!
//! Every failure the gateway produces itself maps to exactly one variant and
//! one client-visible status code. Downstream responses that carry a status
//! are not errors here; they are relayed verbatim by the forwarder.

use std::collections::BTreeSet;

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::auth::token::CredentialFault;
use crate::registry::service::Role;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// No registered service prefix matched, or every matching service
    /// lacked both a satisfying rule and a default role set.
    #[error("no downstream service matches {method} {path}")]
    RouteNotFound { method: Method, path: String },

    /// A restricted route was called without an `Authorization: Bearer`
    /// header.
    #[error("missing bearer credential")]
    MissingCredential,

    /// The presented token failed verification.
    #[error("invalid credential: {0}")]
    InvalidCredential(#[from] CredentialFault),

    /// A restricted route requires an identity but none was produced.
    #[error("authenticated identity required")]
    Unauthenticated,

    /// The caller's roles do not intersect the route's required roles.
    #[error("caller lacks a required role")]
    InsufficientRole { required: BTreeSet<Role> },

    /// The downstream call did not complete within the configured timeout.
    #[error("downstream service {service} timed out")]
    DownstreamTimeout { service: String },

    /// The downstream connection could not be established or failed before
    /// any status was received.
    #[error("downstream service {service} unreachable: {detail}")]
    DownstreamUnreachable { service: String, detail: String },

    /// A fault in the gateway itself, not a downstream failure. The detail
    /// is logged, never exposed to the caller.
    #[error("internal gateway fault")]
    Internal(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::MissingCredential
            | GatewayError::InvalidCredential(_)
            | GatewayError::Unauthenticated => StatusCode::UNAUTHORIZED,
            GatewayError::InsufficientRole { .. } => StatusCode::FORBIDDEN,
            GatewayError::DownstreamTimeout { .. }
            | GatewayError::DownstreamUnreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            GatewayError::InsufficientRole { required } => json!({
                "message": self.to_string(),
                "required_roles": required.iter().map(Role::as_str).collect::<Vec<_>>(),
            }),
            GatewayError::DownstreamTimeout { service } => json!({
                "message": "downstream request timed out",
                "service": service,
            }),
            GatewayError::DownstreamUnreachable { service, detail } => json!({
                "message": "downstream service unreachable",
                "service": service,
                "detail": detail,
            }),
            // Sanitized: internal detail stays in the logs.
            GatewayError::Internal(_) => json!({ "message": "internal gateway error" }),
            other => json!({ "message": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
