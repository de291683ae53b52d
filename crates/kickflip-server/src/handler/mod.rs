//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod comments;
mod error;
mod monitors;
pub mod request;
pub mod response;

use axum::Router;
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::service::ServiceState;

/// Tracing target for rendered error responses.
pub const TRACING_TARGET_ERROR: &str = "kickflip_server::handler::error";

/// Tracing target for request extraction failures.
pub const TRACING_TARGET_EXTRACT: &str = "kickflip_server::extract";

/// Tracing target for acting user extraction.
pub const TRACING_TARGET_ACTOR: &str = "kickflip_server::extract::actor";

/// Answers every unmatched route.
async fn fallback() -> Response {
    ErrorKind::NotFound
        .with_message("No route matches the request")
        .into_response()
}

/// Returns a [`Router`] with every route, bound to the given state.
pub fn routes(state: ServiceState) -> Router {
    Router::new()
        .merge(comments::routes())
        .merge(monitors::routes())
        .fallback(fallback)
        .with_state(state)
}
