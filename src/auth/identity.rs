//! Identity extraction: the first pipeline stage.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::http::{header, HeaderMap, Method};

use crate::auth::token::TokenVerifier;
use crate::error::GatewayError;
use crate::registry::service::Role;
use crate::registry::table::ServiceRegistry;

/// The verified caller, derived once per request and immutable for the
/// request's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub username: String,
    pub roles: BTreeSet<Role>,
}

/// First stage of the pipeline.
///
/// Resolves the route to learn its access requirement; open routes skip
/// extraction entirely (even a present-but-invalid header is ignored).
/// Restricted routes require a verifiable bearer credential.
pub struct Authenticator {
    registry: Arc<ServiceRegistry>,
    verifier: TokenVerifier,
}

impl Authenticator {
    pub fn new(registry: Arc<ServiceRegistry>, verifier: TokenVerifier) -> Self {
        Self { registry, verifier }
    }

    /// Produce the caller's identity, or `None` for an open route.
    pub fn authenticate(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<Option<Identity>, GatewayError> {
        let route = self
            .registry
            .resolve(path, method)
            .ok_or_else(|| GatewayError::RouteNotFound {
                method: method.clone(),
                path: path.to_string(),
            })?;

        if route.access.is_open() {
            return Ok(None);
        }

        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(GatewayError::MissingCredential)?;

        let identity = self.verifier.verify(token)?;
        tracing::debug!(subject = %identity.subject, username = %identity.username, "Credential verified");
        Ok(Some(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::Claims;
    use crate::config::schema::{RouteRuleConfig, ServiceConfig};
    use crate::registry::service::RouteMethod;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, get_current_timestamp, EncodingKey, Header};

    const SECRET: &str = "extractor-test-secret";

    fn registry() -> Arc<ServiceRegistry> {
        let registry = ServiceRegistry::new();
        registry
            .register(&ServiceConfig {
                name: "auth".to_string(),
                url: "http://127.0.0.1:3001".to_string(),
                prefix: "/auth-service".to_string(),
                routes: vec![
                    RouteRuleConfig {
                        path: "/auth/login".to_string(),
                        method: RouteMethod::Post,
                        roles: vec!["PUBLIC".to_string()],
                    },
                    RouteRuleConfig {
                        path: "/users/me".to_string(),
                        method: RouteMethod::Get,
                        roles: vec!["USER".to_string(), "ADMIN".to_string()],
                    },
                ],
                default_roles: None,
                health_check_path: None,
            })
            .unwrap();
        Arc::new(registry)
    }

    fn authenticator() -> Authenticator {
        Authenticator::new(registry(), TokenVerifier::new(SECRET))
    }

    fn bearer(secret: &str) -> HeaderMap {
        let claims = Claims {
            sub: "user-1".to_string(),
            username: "alice".to_string(),
            roles: vec!["USER".to_string()],
            exp: get_current_timestamp() as i64 + 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn open_route_skips_extraction() {
        let auth = authenticator();
        let identity = auth
            .authenticate(&Method::POST, "/auth-service/auth/login", &HeaderMap::new())
            .unwrap();
        assert!(identity.is_none());
    }

    #[test]
    fn open_route_ignores_invalid_header() {
        let auth = authenticator();
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer junk"));
        assert!(auth
            .authenticate(&Method::POST, "/auth-service/auth/login", &headers)
            .unwrap()
            .is_none());
    }

    #[test]
    fn restricted_route_requires_header() {
        let auth = authenticator();
        let err = auth
            .authenticate(&Method::GET, "/auth-service/users/me", &HeaderMap::new())
            .unwrap_err();
        assert!(matches!(err, GatewayError::MissingCredential));
    }

    #[test]
    fn restricted_route_yields_identity() {
        let auth = authenticator();
        let identity = auth
            .authenticate(&Method::GET, "/auth-service/users/me", &bearer(SECRET))
            .unwrap()
            .expect("identity expected");
        assert_eq!(identity.username, "alice");
    }

    #[test]
    fn forged_token_is_rejected() {
        let auth = authenticator();
        let err = auth
            .authenticate(&Method::GET, "/auth-service/users/me", &bearer("forged"))
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidCredential(_)));
    }

    #[test]
    fn unknown_route_is_not_found() {
        let auth = authenticator();
        let err = auth
            .authenticate(&Method::GET, "/elsewhere", &HeaderMap::new())
            .unwrap_err();
        assert!(matches!(err, GatewayError::RouteNotFound { .. }));
    }
}
