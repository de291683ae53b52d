//! HTTP server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::ops::RangeInclusive;
use std::time::Duration;

use anyhow::{Result as AnyhowResult, ensure};
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// HTTP server configuration.
///
/// # Environment Variables
///
/// - `HOST` - Server host address (default: 127.0.0.1)
/// - `PORT` - Server port (default: 3000, valid range: 1024-65535)
/// - `SHUTDOWN_TIMEOUT` - Graceful shutdown timeout in seconds (default: 30, max: 300)
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct ServerConfig {
    /// Host address to bind the server to.
    ///
    /// Use "127.0.0.1" for localhost only, "0.0.0.0" for all interfaces.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// TCP port number for the server to listen on.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Maximum time in seconds to wait for in-flight requests after a
    /// shutdown signal before the server stops regardless.
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 30)]
    pub shutdown_timeout: u64,
}

const MIN_PORT: u16 = 1024;
const SHUTDOWN_TIMEOUT_SECS: RangeInclusive<u64> = 1..=300;

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

impl ServerConfig {
    /// Rejects privileged ports and shutdown timeouts outside 1-300 seconds.
    pub fn validate(&self) -> AnyhowResult<()> {
        ensure!(
            self.port >= MIN_PORT,
            "port {} needs root privileges, pick one in {MIN_PORT}-65535",
            self.port
        );
        ensure!(
            SHUTDOWN_TIMEOUT_SECS.contains(&self.shutdown_timeout),
            "shutdown timeout of {}s is outside 1-300s",
            self.shutdown_timeout
        );
        Ok(())
    }

    #[must_use]
    pub const fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the graceful shutdown timeout as a `Duration`.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    /// Returns whether the server binds to "0.0.0.0" or "::".
    #[must_use]
    pub const fn binds_to_all_interfaces(&self) -> bool {
        self.host.is_unspecified()
    }

    /// Returns whether only local clients can connect.
    #[must_use]
    pub fn is_loopback_only(&self) -> bool {
        self.host.is_loopback()
    }

    /// Logs the server configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            host = %self.host,
            port = self.port,
            shutdown_timeout_secs = self.shutdown_timeout,
            loopback_only = self.is_loopback_only(),
            "Server configuration"
        );
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: 3000,
            shutdown_timeout: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv6Addr;

    use super::*;

    #[test]
    fn defaults_listen_locally_on_3000() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.is_loopback_only());
        assert_eq!(config.server_addr(), SocketAddr::from(([127, 0, 0, 1], 3000)));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn privileged_port_is_rejected() {
        let config = ServerConfig {
            port: 443,
            ..ServerConfig::default()
        };

        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("port 443"));
    }

    #[test]
    fn shutdown_timeout_bounds() {
        for (secs, valid) in [(0, false), (1, true), (300, true), (301, false)] {
            let config = ServerConfig {
                shutdown_timeout: secs,
                ..ServerConfig::default()
            };
            assert_eq!(config.validate().is_ok(), valid, "shutdown_timeout = {secs}");
        }
    }

    #[test]
    fn unspecified_hosts_bind_everything() {
        for host in [
            IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        ] {
            let config = ServerConfig {
                host,
                ..ServerConfig::default()
            };
            assert!(config.binds_to_all_interfaces());
            assert!(!config.is_loopback_only());
        }
    }
}
