//! HTTP server setup and the request pipeline.
//!
//! # Responsibilities
//! - Create the Axum catch-all router
//! - Wire up middleware (tracing, timeout, request ID, connection cap)
//! - Run the three pipeline stages in strict order per request:
//!   authenticate, authorize, forward
//! - Spawn the health monitor and the admin listener
//!
//! # Pipeline
//! ```text
//! RECEIVED → AUTHENTICATING → AUTHORIZING → FORWARDING → RESPONDED | FAILED
//! ```
//! Both guard stages resolve the route independently through the registry;
//! a failure in any stage terminates the request with its mapped status and
//! no downstream call is made.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::{setup_admin_router, AdminState};
use crate::auth::guard::CapabilityGuard;
use crate::auth::identity::Authenticator;
use crate::auth::token::TokenVerifier;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::health::active::HealthMonitor;
use crate::http::request::{request_id, RequestIdLayer};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::proxy::forwarder::Forwarder;
use crate::registry::table::{RegistryError, ServiceRegistry};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ServiceRegistry>,
    pub authenticator: Arc<Authenticator>,
    pub guard: Arc<CapabilityGuard>,
    pub forwarder: Arc<Forwarder>,
}

/// Stage the request is in, for logs and failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Received,
    Authenticating,
    Authorizing,
    Forwarding,
    Responded,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Received => "received",
            Phase::Authenticating => "authenticating",
            Phase::Authorizing => "authorizing",
            Phase::Forwarding => "forwarding",
            Phase::Responded => "responded",
        };
        f.write_str(name)
    }
}

/// HTTP server for the edge gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    registry: Arc<ServiceRegistry>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, RegistryError> {
        let registry = Arc::new(ServiceRegistry::from_config(&config.services)?);

        let verifier = TokenVerifier::new(&config.auth.jwt_secret);
        let state = AppState {
            registry: registry.clone(),
            authenticator: Arc::new(Authenticator::new(registry.clone(), verifier)),
            guard: Arc::new(CapabilityGuard::new(registry.clone())),
            forwarder: Arc::new(Forwarder::new(Duration::from_millis(
                config.timeouts.forward_ms,
            ))),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            registry,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(ingress_handler))
            .route("/", any(ingress_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
            .layer(ConcurrencyLimitLayer::new(config.listener.max_connections))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            services = self.registry.len(),
            "HTTP server starting"
        );

        // Health monitor probes services that declare a check path.
        if self.config.health_check.enabled {
            let monitor = HealthMonitor::new(self.registry.clone(), self.config.health_check.clone());
            let monitor_shutdown = shutdown.subscribe();
            tokio::spawn(async move {
                monitor.run(monitor_shutdown).await;
            });
        }

        // Admin surface runs on its own listener.
        if self.config.admin.enabled {
            let admin_router = setup_admin_router(AdminState {
                registry: self.registry.clone(),
                api_key: self.config.admin.api_key.clone(),
            });
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            let mut admin_shutdown = shutdown.subscribe();
            tracing::info!(address = %self.config.admin.bind_address, "Admin listener starting");
            tokio::spawn(async move {
                let _ = axum::serve(admin_listener, admin_router)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
            });
        }

        let mut server_shutdown = shutdown.subscribe();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The registry backing this server (admin/tests).
    pub fn registry(&self) -> Arc<ServiceRegistry> {
        self.registry.clone()
    }
}

/// Catch-all ingress handler: the pipeline entry point.
async fn ingress_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let started = Instant::now();
    let request_id = request_id(request.headers());
    let method = request.method().clone();
    let method_str = method.to_string();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        phase = %Phase::Received,
        "Request admitted"
    );

    // Stage 1: identity extraction. Short-circuits for open routes.
    let identity = match state.authenticator.authenticate(&method, &path, request.headers()) {
        Ok(identity) => identity,
        Err(err) => return reject(err, Phase::Authenticating, &method_str, &request_id, started),
    };

    // Stage 2: capability check. Re-resolves and denies before any network
    // call.
    let route = match state.guard.authorize(&method, &path, identity.as_ref()) {
        Ok(route) => route,
        Err(err) => return reject(err, Phase::Authorizing, &method_str, &request_id, started),
    };

    // Stage 3: the single downstream call.
    let service_name = route.service.name.clone();
    match state.forwarder.forward(&route, request).await {
        Ok(response) => {
            let status = response.status();
            metrics::record_request(&method_str, status.as_u16(), &service_name, started);
            tracing::debug!(
                request_id = %request_id,
                service = %service_name,
                status = %status,
                phase = %Phase::Responded,
                "Relaying downstream response"
            );
            response
        }
        Err(err) => {
            let status = err.status_code();
            metrics::record_request(&method_str, status.as_u16(), &service_name, started);
            tracing::warn!(
                request_id = %request_id,
                service = %service_name,
                status = %status,
                phase = %Phase::Forwarding,
                error = %err,
                "Downstream call failed"
            );
            err.into_response()
        }
    }
}

/// Terminal rejection before any downstream call was made.
fn reject(
    err: GatewayError,
    phase: Phase,
    method: &str,
    request_id: &str,
    started: Instant,
) -> Response {
    let status = err.status_code();
    metrics::record_request(method, status.as_u16(), "none", started);
    tracing::warn!(
        request_id = %request_id,
        phase = %phase,
        status = %status,
        error = %err,
        "Request rejected"
    );
    err.into_response()
}
