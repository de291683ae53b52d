//! Liveness endpoint.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;

use crate::extract::Json;
use crate::handler::response::{MonitorStatus, ServiceStatus};
use crate::service::ServiceState;

/// Tracing target for monitor operations.
const TRACING_TARGET: &str = "kickflip_server::handler::monitors";

/// Reports whether the server and its database are reachable.
///
/// Without a database attached the server is healthy as long as it answers.
#[tracing::instrument(skip_all)]
async fn health_status(
    State(service_state): State<ServiceState>,
) -> (StatusCode, Json<MonitorStatus>) {
    let status = match service_state.pg_client() {
        None => ServiceStatus::Healthy,
        Some(pg_client) => match pg_client.ping().await {
            Ok(()) => {
                let pool = pg_client.pool_status();
                if pool.is_under_pressure() {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        size = pool.size,
                        available = pool.available,
                        waiting = pool.waiting,
                        "Database pool under pressure"
                    );
                }
                ServiceStatus::Healthy
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Database health check failed"
                );
                ServiceStatus::Unhealthy
            }
        },
    };

    let status_code = match status {
        ServiceStatus::Healthy => StatusCode::OK,
        ServiceStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    tracing::debug!(target: TRACING_TARGET, status = %status, "Health checked");
    (status_code, Json(MonitorStatus::new(status)))
}

/// Returns a [`Router`] with the monitoring routes.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/health", get(health_status))
}

#[cfg(test)]
mod test {
    use crate::handler::response::{MonitorStatus, ServiceStatus};
    use crate::handler::test::create_test_server;

    #[tokio::test]
    async fn health_without_database() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server.get("/health").await;
        response.assert_status_ok();

        let body: MonitorStatus = response.json();
        assert_eq!(body.status, ServiceStatus::Healthy);
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
        Ok(())
    }
}
