//! The single downstream call: the final pipeline stage.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, Uri};
use axum::response::Response;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;
use url::Url;

use crate::error::GatewayError;
use crate::registry::service::ResolvedRoute;

/// Executes the downstream call for an authorized request.
///
/// Exactly one call per admitted request; a timeout drops the request
/// future, releasing its connection.
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, timeout }
    }

    /// Forward the request to the resolved service and relay the outcome.
    pub async fn forward(
        &self,
        route: &ResolvedRoute,
        request: Request<Body>,
    ) -> Result<Response, GatewayError> {
        let (parts, body) = request.into_parts();

        let target = compose_target(&route.service.base_url, &route.remainder, parts.uri.query());
        let uri: Uri = target
            .parse()
            .map_err(|e| GatewayError::Internal(format!("target uri {}: {}", target, e)))?;

        let mut builder = Request::builder()
            .method(parts.method.clone())
            .uri(uri)
            .version(parts.version);

        if let Some(headers) = builder.headers_mut() {
            for (name, value) in parts.headers.iter() {
                // Hop-specific: the client derives both for the new hop.
                if name == header::HOST || name == header::CONTENT_LENGTH {
                    continue;
                }
                headers.append(name.clone(), value.clone());
            }
        }

        let outbound = builder
            .body(body)
            .map_err(|e| GatewayError::Internal(format!("outbound request: {}", e)))?;

        tracing::debug!(
            service = %route.service.name,
            target = %target,
            "Forwarding downstream"
        );

        match time::timeout(self.timeout, self.client.request(outbound)).await {
            Ok(Ok(response)) => {
                // Relay verbatim, whatever the status.
                let (parts, body) = response.into_parts();
                Ok(Response::from_parts(parts, Body::new(body)))
            }
            Ok(Err(err)) => Err(GatewayError::DownstreamUnreachable {
                service: route.service.name.clone(),
                detail: err.to_string(),
            }),
            Err(_) => Err(GatewayError::DownstreamTimeout {
                service: route.service.name.clone(),
            }),
        }
    }
}

impl std::fmt::Debug for Forwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Forwarder").field("timeout", &self.timeout).finish()
    }
}

/// `base_url + remainder`, with the original query string re-attached.
/// The remainder is passed through exactly as resolved.
fn compose_target(base_url: &Url, remainder: &str, query: Option<&str>) -> String {
    let base = base_url.as_str().trim_end_matches('/');
    let mut target = String::with_capacity(
        base.len() + remainder.len() + query.map_or(0, |q| q.len() + 1),
    );
    target.push_str(base);
    target.push_str(remainder);
    if let Some(query) = query {
        target.push('?');
        target.push_str(query);
    }
    target
}
