//! Application state and dependency injection.

use std::sync::Arc;

use kickflip_core::service::CommentService;
use kickflip_postgres::PgClient;

use crate::service::{Result, ServiceConfig};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    comment_service: CommentService,
    pg_client: Option<PgClient>,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Connects to Postgres, migrates it, and wires the client into every
    /// seam of the comment service.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self> {
        let pg_client = config.connect_postgres().await?;

        let comment_service = CommentService::from_backend(pg_client.clone())
            .with_user_directory(Arc::new(pg_client.clone()))
            .with_dispatcher(Arc::new(pg_client.clone()))
            .with_config(config.comments.clone());

        Ok(Self {
            comment_service,
            pg_client: Some(pg_client),
        })
    }

    /// Wraps an already wired comment service with no database attached.
    pub fn from_service(comment_service: CommentService) -> Self {
        Self {
            comment_service,
            pg_client: None,
        }
    }

    /// Returns the database client, if the state owns one.
    pub fn pg_client(&self) -> Option<&PgClient> {
        self.pg_client.as_ref()
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(comment_service: CommentService);
