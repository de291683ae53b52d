//! Security middleware for HTTP requests.

mod cors;

use axum::Router;
pub use cors::CorsConfig;
pub(crate) use cors::create_cors_layer;

/// Extension trait for `axum::`[`Router`] to apply security middleware.
pub trait RouterSecurityExt<S> {
    /// Layers CORS handling for the configured origins.
    fn with_cors(self, config: &CorsConfig) -> Self;
}

impl<S> RouterSecurityExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_cors(self, config: &CorsConfig) -> Self {
        self.layer(create_cors_layer(config))
    }
}
