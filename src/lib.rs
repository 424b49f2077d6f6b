//! Edge gateway library.
//!
//! Terminates inbound HTTP, authenticates the caller, checks route
//! capabilities, and forwards permitted requests to downstream services.

pub mod admin;
pub mod auth;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod registry;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use registry::ServiceRegistry;
