//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared with subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded and read exactly once at startup; the
//!   routing table it seeds is non-durable and mutated only through the
//!   registry operations
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{
    AdminConfig, AuthConfig, GatewayConfig, HealthCheckConfig, ListenerConfig,
    ObservabilityConfig, RouteRuleConfig, ServiceConfig, TimeoutConfig,
};
