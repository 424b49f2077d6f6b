//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe services that declare a health-check path
//! - Update registry health state based on results

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::observability::metrics;
use crate::registry::service::HealthStatus;
use crate::registry::table::ServiceRegistry;

pub struct HealthMonitor {
    registry: Arc<ServiceRegistry>,
    config: HealthCheckConfig,
    client: Client<HttpConnector, Body>,
}

impl HealthMonitor {
    pub fn new(registry: Arc<ServiceRegistry>, config: HealthCheckConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            registry,
            config,
            client,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            "Health monitor starting"
        );

        let interval = Duration::from_secs(self.config.interval_secs);
        let mut ticker = time::interval(interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn check_all(&self) {
        for service in self.registry.services() {
            // Services without a probe path keep whatever state collaborators
            // report through the admin surface.
            let Some(check_path) = &service.health_check_path else {
                continue;
            };

            let uri_string = format!(
                "{}{}",
                service.base_url.as_str().trim_end_matches('/'),
                check_path
            );

            let request = match Request::builder()
                .method("GET")
                .uri(&uri_string)
                .header("user-agent", "edge-gateway-health-check")
                .body(Body::empty())
            {
                Ok(req) => req,
                Err(e) => {
                    tracing::error!(service = %service.name, error = %e, "Failed to build health check request");
                    continue;
                }
            };

            let timeout = Duration::from_secs(self.config.timeout_secs);
            let response_future = self.client.request(request);

            let healthy = match time::timeout(timeout, response_future).await {
                Ok(Ok(response)) => {
                    let success = response.status().is_success();
                    if !success {
                        tracing::warn!(service = %service.name, status = %response.status(), "Health check failed: non-success status");
                    }
                    success
                }
                Ok(Err(e)) => {
                    tracing::warn!(service = %service.name, error = %e, "Health check failed: connection error");
                    false
                }
                Err(_) => {
                    tracing::warn!(service = %service.name, "Health check failed: timeout");
                    false
                }
            };

            let status = if healthy {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            };
            self.registry.update_health(&service.id, status);

            metrics::record_service_health(&service.name, healthy);
        }
    }
}
