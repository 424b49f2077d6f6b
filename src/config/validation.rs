//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check service table entries (URLs, prefixes, rule paths, roles)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Rule paths with `:param` segments are rejected: matching is literal,
//!   and a placeholder would only ever match its own spelling

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {}", config.listener.bind_address),
        ));
    }

    if config.auth.jwt_secret.is_empty() {
        errors.push(ValidationError::new("auth.jwt_secret", "must not be empty"));
    }

    if config.timeouts.forward_ms == 0 {
        errors.push(ValidationError::new("timeouts.forward_ms", "must be > 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    for (i, service) in config.services.iter().enumerate() {
        let field = |suffix: &str| format!("services[{}].{}", i, suffix);

        if service.name.is_empty() {
            errors.push(ValidationError::new(field("name"), "must not be empty"));
        }

        match Url::parse(&service.url) {
            Ok(url) if url.scheme() != "http" => {
                errors.push(ValidationError::new(
                    field("url"),
                    format!("unsupported scheme {:?}, only http is forwarded", url.scheme()),
                ));
            }
            Ok(_) => {}
            Err(e) => {
                errors.push(ValidationError::new(field("url"), format!("invalid url: {}", e)));
            }
        }

        if !service.prefix.starts_with('/') || service.prefix.len() < 2 {
            errors.push(ValidationError::new(
                field("prefix"),
                "must start with '/' and name a path segment",
            ));
        } else if service.prefix.ends_with('/') {
            errors.push(ValidationError::new(
                field("prefix"),
                "must not end with '/'",
            ));
        }

        for (j, rule) in service.routes.iter().enumerate() {
            let field = |suffix: &str| format!("services[{}].routes[{}].{}", i, j, suffix);

            if !rule.path.starts_with('/') {
                errors.push(ValidationError::new(field("path"), "must start with '/'"));
            }
            if rule.path.split('/').any(|segment| segment.starts_with(':')) {
                errors.push(ValidationError::new(
                    field("path"),
                    "parameter segments are not supported; paths match literally",
                ));
            }
            if rule.roles.is_empty() {
                errors.push(ValidationError::new(field("roles"), "must not be empty"));
            }
        }

        if let Some(default_roles) = &service.default_roles {
            if default_roles.is_empty() {
                errors.push(ValidationError::new(
                    field("default_roles"),
                    "must not be empty when present",
                ));
            }
        }
    }

    if config.admin.enabled {
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::new("admin.api_key", "must not be empty"));
        }
        if config.admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "admin.bind_address",
                format!("not a socket address: {}", config.admin.bind_address),
            ));
        }
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {}", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
