//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     ServiceConfig[] (static configuration)
//!     → register() each entry
//!     → immutable RegistryTable snapshot
//!
//! Per request:
//!     (path, method)
//!     → resolve() scans healthy services in registration order
//!     → first prefix match, then first rule match (or default access)
//!     → ResolvedRoute or None
//!
//! Runtime mutation (admin / health collaborators):
//!     register / unregister / update_health
//!     → copy-on-write replacement of the whole snapshot
//! ```
//!
//! # Design Decisions
//! - Table is an immutable snapshot swapped atomically on every mutation;
//!   readers are lock-free and never observe a partially mutated entry
//! - Deterministic: same snapshot + same (path, method) → same result
//! - First match wins, in registration order
//! - Explicit None rather than silent default on no match
//! - No durability: the table is rebuilt from configuration on restart

pub mod service;
pub mod table;

pub use service::{
    HealthState, HealthStatus, RegisteredService, ResolvedRoute, Role, RouteAccess, RouteMethod,
    RouteRule,
};
pub use table::{RegistryError, ServiceRegistry};
