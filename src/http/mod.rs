//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all route)
//!     → request.rs (request ID)
//!     → auth stages decide, forwarder executes
//!     → downstream response relayed to client
//! ```

pub mod request;
pub mod server;

pub use request::{request_id, RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
