//! Registry domain types.
//!
//! # Responsibilities
//! - Represent a registered downstream service and its route rules
//! - Model route access as `Open` vs `Restricted(roles)`
//! - Track per-service health state
//!
//! # Design Decisions
//! - The configuration-level `PUBLIC` sentinel is translated to
//!   `RouteAccess::Open` at load time; it never participates in
//!   role-membership checks
//! - Roles are opaque case-sensitive names owned by the auth collaborator;
//!   the gateway only compares them

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use axum::http::Method;
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration sentinel meaning "no restriction, no identity required".
pub const PUBLIC_SENTINEL: &str = "PUBLIC";

/// A named capability required to access a route.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// HTTP method selector for a route rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    /// Wildcard: matches every method.
    All,
}

impl RouteMethod {
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            RouteMethod::All => true,
            RouteMethod::Get => method == Method::GET,
            RouteMethod::Post => method == Method::POST,
            RouteMethod::Put => method == Method::PUT,
            RouteMethod::Patch => method == Method::PATCH,
            RouteMethod::Delete => method == Method::DELETE,
        }
    }
}

/// Access requirement attached to a route rule.
///
/// The "no restriction" case is a distinct variant so the guard never has to
/// compare a sentinel against a caller's role set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccess {
    /// Anyone may call; no identity is required or extracted.
    Open,
    /// Caller must hold at least one of these roles.
    Restricted(BTreeSet<Role>),
}

impl RouteAccess {
    /// Translate a configuration role list. Any occurrence of the `PUBLIC`
    /// sentinel makes the whole rule open.
    pub fn from_role_names(names: &[String]) -> Self {
        if names.iter().any(|n| n == PUBLIC_SENTINEL) {
            RouteAccess::Open
        } else {
            RouteAccess::Restricted(names.iter().map(Role::new).collect())
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, RouteAccess::Open)
    }
}

/// A single literal-path rule within a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    /// Literal path, matched against the request path with the service
    /// prefix stripped (query string ignored).
    pub path: String,
    pub method: RouteMethod,
    pub access: RouteAccess,
}

/// Service health, as last reported by a health collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone)]
pub struct HealthState {
    pub status: HealthStatus,
    pub last_seen: SystemTime,
    pub consecutive_failures: u32,
}

impl HealthState {
    /// Initial state: services start healthy until a check says otherwise.
    pub fn healthy_now() -> Self {
        Self {
            status: HealthStatus::Healthy,
            last_seen: SystemTime::now(),
            consecutive_failures: 0,
        }
    }
}

/// A downstream service held by the registry.
///
/// Immutable once inserted into a snapshot; every mutation replaces the
/// entry (and the snapshot) wholesale.
#[derive(Debug, Clone)]
pub struct RegisteredService {
    /// Unique within the registry at all times.
    pub id: String,
    pub name: String,
    pub base_url: Url,
    /// Leading path segment identifying this service.
    pub prefix: String,
    /// Ordered; first match wins.
    pub rules: Vec<RouteRule>,
    /// Fallback access when no rule matches. `None` means resolution fails
    /// for this service and the scan continues.
    pub default_access: Option<RouteAccess>,
    pub health_check_path: Option<String>,
    pub health: HealthState,
}

impl RegisteredService {
    pub fn is_healthy(&self) -> bool {
        self.health.status == HealthStatus::Healthy
    }
}

/// Outcome of a successful resolution: the service to forward to, the
/// access requirement that applies, and the path remainder to forward.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub service: Arc<RegisteredService>,
    /// From the matched rule, or synthesized from the service default.
    pub access: RouteAccess,
    /// Request path with the matched prefix removed, forwarded unchanged.
    pub remainder: String,
}
