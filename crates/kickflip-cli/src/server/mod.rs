//! HTTP server startup, graceful shutdown and lifecycle logging.

mod error;
mod http_server;
mod lifecycle;
mod shutdown;

use axum::Router;
pub use error::{ServerError, ServerResult};
use shutdown::shutdown_signal;

use crate::config::ServerConfig;

/// Binds the configured address and serves `app` until SIGINT or SIGTERM.
///
/// In-flight requests get up to the configured shutdown timeout to finish.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the address cannot be
/// bound, or the server fails while running.
pub async fn serve(app: Router, config: ServerConfig) -> ServerResult<()> {
    http_server::serve_http(app, config).await
}
