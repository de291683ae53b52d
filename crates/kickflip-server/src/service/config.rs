#[cfg(feature = "config")]
use clap::Args;
use kickflip_core::CommentConfig;
use kickflip_postgres::{PgClient, PgClientMigrationExt, PgConfig};
use serde::{Deserialize, Serialize};

use crate::service::{Error, Result};

/// Tracing target for service wiring.
const TRACING_TARGET: &str = "kickflip_server::service";

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct ServiceConfig {
    /// Postgres connection pool.
    #[cfg_attr(feature = "config", command(flatten))]
    pub postgres: PgConfig,

    /// Comment subsystem tunables.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    pub comments: CommentConfig,
}

impl ServiceConfig {
    /// Creates a configuration with default comment tunables.
    pub fn new(postgres: PgConfig) -> Self {
        Self {
            postgres,
            comments: CommentConfig::default(),
        }
    }

    /// Sets the comment tunables.
    pub fn with_comments(mut self, comments: CommentConfig) -> Self {
        self.comments = comments;
        self
    }

    /// Connects to Postgres and applies pending migrations.
    pub async fn connect_postgres(&self) -> Result<PgClient> {
        let pg_client = self.postgres.clone().build().map_err(|e| {
            Error::external("postgres", "Failed to create database client").with_source(e)
        })?;

        let migrations = pg_client.run_pending_migrations().await.map_err(|e| {
            Error::external("postgres", "Failed to apply database migrations").with_source(e)
        })?;

        tracing::info!(
            target: TRACING_TARGET,
            applied = migrations.processed_versions.len(),
            duration_ms = migrations.duration.as_millis() as u64,
            "Database migrations applied"
        );

        pg_client.verify_schema_integrity().await.map_err(|e| {
            Error::external("postgres", "Comment schema is incomplete").with_source(e)
        })?;

        Ok(pg_client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_pool_size_is_a_config_error() {
        let config =
            ServiceConfig::new(PgConfig::new("postgres://localhost/kickflip").with_max_connections(0));

        let error = config.connect_postgres().await.unwrap_err();
        assert_eq!(error.kind(), crate::ErrorKind::External);
        assert!(error.message().contains("database client"));
    }
}
