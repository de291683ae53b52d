//! Middleware for `axum::Router` and HTTP request processing.
//!
//! - observability: request ids, request spans, sensitive header redaction
//! - recovery: request timeouts and panic capture
//! - security: CORS

mod observability;
mod recovery;
pub mod security;

pub use observability::RouterObservabilityExt;
pub use recovery::{RecoveryConfig, RouterRecoveryExt};
pub use security::{CorsConfig, RouterSecurityExt};

/// Tracing target for recovered middleware errors.
pub const TRACING_TARGET_RECOVERY: &str = "kickflip_server::middleware::recovery";

/// Tracing target for recovered panics.
pub const TRACING_TARGET_PANIC: &str = "kickflip_server::middleware::panic";
