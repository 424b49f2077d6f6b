//! Authentication and authorization stages.
//!
//! # Data Flow
//! ```text
//! Request headers + (path, method)
//!     → identity.rs (Authenticator): resolve route, skip when open,
//!       else verify bearer token → Identity
//!     → guard.rs (CapabilityGuard): re-resolve route, check role
//!       intersection → ResolvedRoute for the forwarder
//! ```
//!
//! # Design Decisions
//! - The guard re-resolves the route itself instead of trusting a value
//!   cached by the extractor; registry determinism guarantees agreement
//! - Claims are trusted as of token issuance; no role store is consulted,
//!   so a role change takes effect when the subject re-authenticates
//! - The extractor performs no network calls and has no side effects

pub mod guard;
pub mod identity;
pub mod token;

pub use guard::CapabilityGuard;
pub use identity::{Authenticator, Identity};
pub use token::{Claims, CredentialFault, TokenVerifier};
