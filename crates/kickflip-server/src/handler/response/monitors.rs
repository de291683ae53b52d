//! Monitor response types.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

/// Coarse health of the server and its database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ServiceStatus {
    Healthy,
    Unhealthy,
}

#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    pub checked_at: Timestamp,
    pub status: ServiceStatus,
    pub version: String,
}

impl MonitorStatus {
    pub fn new(status: ServiceStatus) -> Self {
        Self {
            checked_at: Timestamp::now(),
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
