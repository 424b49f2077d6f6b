//! Capability check: the second pipeline stage.

use std::sync::Arc;

use axum::http::Method;

use crate::auth::identity::Identity;
use crate::error::GatewayError;
use crate::registry::service::{ResolvedRoute, RouteAccess};
use crate::registry::table::ServiceRegistry;

/// Second stage of the pipeline. Runs strictly after the [`Authenticator`]
/// and before any network call.
///
/// Resolves the route independently rather than trusting a value cached by
/// the extractor; the registry's determinism guarantees both stages agree.
///
/// [`Authenticator`]: crate::auth::identity::Authenticator
pub struct CapabilityGuard {
    registry: Arc<ServiceRegistry>,
}

impl CapabilityGuard {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }

    /// Decide whether the caller may reach the route; on success, hand the
    /// resolved route to the forwarder.
    pub fn authorize(
        &self,
        method: &Method,
        path: &str,
        identity: Option<&Identity>,
    ) -> Result<ResolvedRoute, GatewayError> {
        let route = self
            .registry
            .resolve(path, method)
            .ok_or_else(|| GatewayError::RouteNotFound {
                method: method.clone(),
                path: path.to_string(),
            })?;

        match &route.access {
            RouteAccess::Open => Ok(route),
            RouteAccess::Restricted(required) => {
                let identity = identity.ok_or(GatewayError::Unauthenticated)?;
                if identity.roles.iter().any(|role| required.contains(role)) {
                    Ok(route)
                } else {
                    Err(GatewayError::InsufficientRole {
                        required: required.clone(),
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{RouteRuleConfig, ServiceConfig};
    use crate::registry::service::{Role, RouteMethod};
    use std::collections::BTreeSet;

    fn registry() -> Arc<ServiceRegistry> {
        let registry = ServiceRegistry::new();
        registry
            .register(&ServiceConfig {
                name: "event".to_string(),
                url: "http://127.0.0.1:3002".to_string(),
                prefix: "/event-service".to_string(),
                routes: vec![
                    RouteRuleConfig {
                        path: "/events".to_string(),
                        method: RouteMethod::Get,
                        roles: vec!["PUBLIC".to_string()],
                    },
                    RouteRuleConfig {
                        path: "/events".to_string(),
                        method: RouteMethod::Post,
                        roles: vec!["OPERATOR".to_string(), "ADMIN".to_string()],
                    },
                ],
                default_roles: None,
                health_check_path: None,
            })
            .unwrap();
        Arc::new(registry)
    }

    fn identity(roles: &[&str]) -> Identity {
        Identity {
            subject: "user-1".to_string(),
            username: "alice".to_string(),
            roles: roles.iter().map(|r| Role::new(*r)).collect(),
        }
    }

    #[test]
    fn open_route_allows_anonymous_caller() {
        let guard = CapabilityGuard::new(registry());
        let route = guard
            .authorize(&Method::GET, "/event-service/events", None)
            .unwrap();
        assert_eq!(route.remainder, "/events");
    }

    #[test]
    fn restricted_route_denies_anonymous_caller() {
        let guard = CapabilityGuard::new(registry());
        let err = guard
            .authorize(&Method::POST, "/event-service/events", None)
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthenticated));
    }

    #[test]
    fn disjoint_roles_are_denied_with_diagnostics() {
        let guard = CapabilityGuard::new(registry());
        let caller = identity(&["USER"]);
        let err = guard
            .authorize(&Method::POST, "/event-service/events", Some(&caller))
            .unwrap_err();

        match err {
            GatewayError::InsufficientRole { required } => {
                let expected: BTreeSet<Role> =
                    [Role::new("OPERATOR"), Role::new("ADMIN")].into_iter().collect();
                assert_eq!(required, expected);
            }
            other => panic!("expected InsufficientRole, got {:?}", other),
        }
    }

    #[test]
    fn any_intersecting_role_is_enough() {
        let guard = CapabilityGuard::new(registry());
        let caller = identity(&["USER", "OPERATOR"]);
        assert!(guard
            .authorize(&Method::POST, "/event-service/events", Some(&caller))
            .is_ok());
    }

    #[test]
    fn unknown_route_is_not_found_even_with_identity() {
        let guard = CapabilityGuard::new(registry());
        let caller = identity(&["ADMIN"]);
        let err = guard
            .authorize(&Method::GET, "/nowhere", Some(&caller))
            .unwrap_err();
        assert!(matches!(err, GatewayError::RouteNotFound { .. }));
    }
}
