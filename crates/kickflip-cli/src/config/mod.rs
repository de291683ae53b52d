//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig          # Host, port, shutdown
//! ├── middleware: MiddlewareConfig  # CORS, request timeout
//! └── service: ServiceConfig        # Postgres pool, comment tunables
//! ```
//!
//! Every option can be given as a flag or through its environment variable.

mod middleware;
mod server;

use std::process;

use anyhow::Context;
use clap::Parser;
use kickflip_server::service::ServiceConfig;
pub use middleware::MiddlewareConfig;
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "kickflip")]
#[command(about = "Kickflip comment threads server")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// HTTP middleware configuration (CORS, timeouts).
    #[clap(flatten)]
    pub middleware: MiddlewareConfig,

    /// Database and comment subsystem configuration.
    #[clap(flatten)]
    pub service: ServiceConfig,
}

impl Cli {
    /// Loads the `.env` file (if enabled) and parses CLI arguments.
    ///
    /// The file is read first so that clap's `env` lookups see its values.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.middleware
            .validate()
            .context("invalid middleware configuration")?;
        self.service
            .postgres
            .validate()
            .context("invalid database configuration")?;
        Ok(())
    }

    /// Logs configuration without credentials.
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        self.server.log();
        self.middleware.log();

        let postgres = &self.service.postgres;
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            postgres_url = %postgres.database_url_masked(),
            postgres_max_connections = postgres.postgres_max_connections,
            postgres_connection_timeout_secs = ?postgres.postgres_connection_timeout_secs,
            postgres_idle_timeout_secs = ?postgres.postgres_idle_timeout_secs,
            "Database configuration"
        );

        let comments = &self.service.comments;
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            default_page_size = comments.default_page_size,
            max_content_length = comments.max_content_length,
            max_thread_depth = comments.max_thread_depth,
            orphan_policy = %comments.orphan_policy,
            "Comment configuration"
        );
    }

    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
