//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe each service with a declared health-check path
//!     → registry.update_health(id, Healthy | Unhealthy)
//!
//! Admin collaborators may also report health directly through the admin
//! surface; both paths converge on the same registry operation.
//! ```
//!
//! # Design Decisions
//! - A probe answers 2xx when the service is ready; anything else
//!   (non-success, connection error, timeout) marks it unhealthy
//! - Unhealthy services are excluded from route resolution until a later
//!   probe or report marks them healthy again

pub mod active;

pub use active::HealthMonitor;
