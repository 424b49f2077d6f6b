//! The registry table: lock-free reads, copy-on-write mutation.
//!
//! # Responsibilities
//! - Hold the process-wide set of registered services
//! - Resolve a (path, method) pair to a service + access rule
//! - Apply runtime mutations (register, unregister, health updates)
//!
//! # Design Decisions
//! - Snapshot is an `ArcSwap`; every mutation builds a fresh table and swaps
//!   it in, so concurrent resolves observe either the old or the new table
//!   in full, never an intermediate state
//! - Resolution is a pure function of (snapshot, path, method); the identity
//!   extractor and the capability guard each resolve independently and must
//!   reach the same result

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::Method;
use thiserror::Error;
use url::Url;

use crate::config::schema::ServiceConfig;
use crate::registry::service::{
    HealthState, HealthStatus, RegisteredService, ResolvedRoute, RouteAccess, RouteRule,
};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("service {name}: invalid base url {url}: {source}")]
    InvalidBaseUrl {
        name: String,
        url: String,
        source: url::ParseError,
    },
}

#[derive(Debug, Default)]
struct RegistryTable {
    services: Vec<Arc<RegisteredService>>,
}

/// Process-wide routing table.
///
/// In-memory only: rebuilt from static configuration on every restart.
#[derive(Debug)]
pub struct ServiceRegistry {
    table: ArcSwap<RegistryTable>,
    next_seq: AtomicU64,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(RegistryTable::default()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Build a registry from the static configuration table.
    pub fn from_config(services: &[ServiceConfig]) -> Result<Self, RegistryError> {
        let registry = Self::new();
        for service in services {
            registry.register(service)?;
        }
        Ok(registry)
    }

    /// Append a service and return its unique id.
    ///
    /// Append only: an existing service with a conflicting prefix is left in
    /// place, and registration order decides which one wins resolution.
    pub fn register(&self, config: &ServiceConfig) -> Result<String, RegistryError> {
        let base_url = Url::parse(&config.url).map_err(|source| RegistryError::InvalidBaseUrl {
            name: config.name.clone(),
            url: config.url.clone(),
            source,
        })?;

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let id = format!("{}-{}", config.name, seq);

        let rules = config
            .routes
            .iter()
            .map(|rule| RouteRule {
                path: rule.path.clone(),
                method: rule.method,
                access: RouteAccess::from_role_names(&rule.roles),
            })
            .collect();

        let service = Arc::new(RegisteredService {
            id: id.clone(),
            name: config.name.clone(),
            base_url,
            prefix: config.prefix.clone(),
            rules,
            default_access: config
                .default_roles
                .as_deref()
                .map(RouteAccess::from_role_names),
            health_check_path: config.health_check_path.clone(),
            health: HealthState::healthy_now(),
        });

        self.table.rcu(|table| {
            let mut services = table.services.clone();
            services.push(service.clone());
            Arc::new(RegistryTable { services })
        });

        tracing::info!(id = %id, prefix = %config.prefix, url = %config.url, "Service registered");
        Ok(id)
    }

    /// Remove a service by id. Returns whether a removal occurred.
    pub fn unregister(&self, id: &str) -> bool {
        let mut removed = false;
        self.table.rcu(|table| {
            let services: Vec<_> = table
                .services
                .iter()
                .filter(|s| s.id != id)
                .cloned()
                .collect();
            removed = services.len() < table.services.len();
            Arc::new(RegistryTable { services })
        });

        if removed {
            tracing::info!(id = %id, "Service unregistered");
        } else {
            tracing::warn!(id = %id, "Unregister: no such service");
        }
        removed
    }

    /// Update the health state reported for a service. Returns whether the
    /// id was found.
    ///
    /// A healthy report resets the consecutive failure counter; an unhealthy
    /// one increments it.
    pub fn update_health(&self, id: &str, status: HealthStatus) -> bool {
        let mut found = false;
        self.table.rcu(|table| {
            let services = table
                .services
                .iter()
                .map(|s| {
                    if s.id != id {
                        return s.clone();
                    }
                    found = true;
                    let mut updated = (**s).clone();
                    updated.health = HealthState {
                        status,
                        last_seen: std::time::SystemTime::now(),
                        consecutive_failures: match status {
                            HealthStatus::Healthy => 0,
                            HealthStatus::Unhealthy => s.health.consecutive_failures + 1,
                        },
                    };
                    Arc::new(updated)
                })
                .collect();
            Arc::new(RegistryTable { services })
        });

        if found {
            tracing::debug!(id = %id, status = ?status, "Service health updated");
        }
        found
    }

    /// Resolve a request to a service and access rule.
    ///
    /// Scans healthy services in registration order; the first whose prefix
    /// is a literal prefix of the path wins the prefix stage. Within it, the
    /// first rule whose path equals the remainder (query string ignored) and
    /// whose method matches is taken; otherwise the service default applies;
    /// otherwise the scan continues. `None` is the not-found sentinel.
    pub fn resolve(&self, path: &str, method: &Method) -> Option<ResolvedRoute> {
        let path = path.split('?').next().unwrap_or(path);
        let table = self.table.load();

        for service in table.services.iter().filter(|s| s.is_healthy()) {
            let Some(remainder) = path.strip_prefix(&service.prefix) else {
                continue;
            };

            for rule in &service.rules {
                if rule.path == remainder && rule.method.matches(method) {
                    return Some(ResolvedRoute {
                        service: service.clone(),
                        access: rule.access.clone(),
                        remainder: remainder.to_string(),
                    });
                }
            }

            if let Some(default_access) = &service.default_access {
                return Some(ResolvedRoute {
                    service: service.clone(),
                    access: default_access.clone(),
                    remainder: remainder.to_string(),
                });
            }
        }

        None
    }

    /// Snapshot of all registered services (admin listing, health probing).
    pub fn services(&self) -> Vec<Arc<RegisteredService>> {
        self.table.load().services.clone()
    }

    pub fn get(&self, id: &str) -> Option<Arc<RegisteredService>> {
        self.table
            .load()
            .services
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.table.load().services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
