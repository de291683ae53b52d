use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use deadpool::managed::{Hook, Pool};
use derive_more::{Deref, DerefMut};
use diesel_async::RunQueryDsl;
use diesel_async::pooled_connection::{AsyncDieselConnectionManager, ManagerConfig};

use super::custom_hooks;
use crate::{
    ConnectionPool, PgConfig, PgError, PgResult, PooledConnection, TRACING_TARGET_CLIENT,
    TRACING_TARGET_CONNECTION,
};

/// Acquisitions slower than this are logged at `warn`.
const SLOW_ACQUIRE: Duration = Duration::from_millis(100);

/// Share of checked-out connections above which the pool counts as busy.
const PRESSURE_THRESHOLD: f64 = 0.8;

/// Snapshot of the connection pool, as reported by the health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgPoolStatus {
    pub max_size: usize,
    pub size: usize,
    /// Idle connections ready to be handed out.
    pub available: usize,
    /// Callers queued for a connection.
    pub waiting: usize,
}

impl PgPoolStatus {
    /// Connections currently checked out.
    pub fn in_use(&self) -> usize {
        self.size.saturating_sub(self.available)
    }

    /// Checked-out connections as a share of the pool size, in `0.0..=1.0`.
    pub fn utilization(&self) -> f64 {
        match self.max_size {
            0 => 0.0,
            max => self.in_use() as f64 / max as f64,
        }
    }

    /// True once callers queue or most connections are checked out.
    pub fn is_under_pressure(&self) -> bool {
        self.waiting > 0 || self.utilization() > PRESSURE_THRESHOLD
    }
}

impl From<deadpool::Status> for PgPoolStatus {
    fn from(status: deadpool::Status) -> Self {
        Self {
            max_size: status.max_size,
            size: status.size,
            available: status.available,
            waiting: status.waiting,
        }
    }
}

/// Pooled database client.
///
/// Cheap to clone. Implements every storage seam of `kickflip-core`, so a
/// single client backs the whole comment service.
#[derive(Clone)]
pub struct PgClient {
    inner: Arc<PgClientInner>,
}

struct PgClientInner {
    pool: ConnectionPool,
    config: PgConfig,
}

impl PgClient {
    /// Creates a client and its connection pool. Connections are opened lazily.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool configuration is invalid.
    #[tracing::instrument(
        skip(config),
        target = TRACING_TARGET_CLIENT,
        fields(database_url = %config.database_url_masked())
    )]
    pub fn new(config: PgConfig) -> PgResult<Self> {
        tracing::info!(target: TRACING_TARGET_CLIENT, "Initializing database client");

        let mut manager_config = ManagerConfig::default();
        manager_config.custom_setup = Box::new(custom_hooks::setup_callback);
        let manager =
            AsyncDieselConnectionManager::new_with_config(&config.postgres_url, manager_config);

        let pool = Pool::builder(manager)
            .max_size(config.postgres_max_connections as usize)
            .wait_timeout(config.connection_timeout())
            .create_timeout(config.connection_timeout())
            .recycle_timeout(config.idle_timeout())
            .runtime(deadpool::Runtime::Tokio1)
            .post_create(Hook::sync_fn(custom_hooks::post_create))
            .pre_recycle(Hook::sync_fn(custom_hooks::pre_recycle))
            .post_recycle(Hook::sync_fn(custom_hooks::post_recycle))
            .build()
            .map_err(|e| {
                tracing::error!(target: TRACING_TARGET_CLIENT, error = %e, "Failed to create connection pool");
                PgError::Unexpected(format!("Failed to build connection pool: {e}").into())
            })?;

        Ok(Self {
            inner: Arc::new(PgClientInner { pool, config }),
        })
    }

    /// Runs a trivial query to check that the database answers.
    pub async fn ping(&self) -> PgResult<()> {
        #[derive(diesel::QueryableByName)]
        struct Ping {
            #[diesel(sql_type = diesel::sql_types::Integer)]
            #[allow(dead_code)]
            result: i32,
        }

        let mut conn = self.checkout().await?;
        let _: Ping = diesel::sql_query("SELECT 1 AS result")
            .get_result(&mut *conn)
            .await
            .map_err(|e| {
                tracing::error!(target: TRACING_TARGET_CONNECTION, error = %e, "Database connectivity test failed");
                PgError::from(e)
            })?;

        Ok(())
    }

    /// Checks a connection out of the pool, waiting up to the configured
    /// connection timeout.
    pub async fn get_connection(&self) -> PgResult<PgConn> {
        self.checkout().await.map(|conn| PgConn { conn })
    }

    async fn checkout(&self) -> PgResult<PooledConnection> {
        let started = Instant::now();
        let result = self.inner.pool.get().await;
        let waited = started.elapsed();

        match result {
            Ok(conn) => {
                if waited > SLOW_ACQUIRE {
                    tracing::warn!(
                        target: TRACING_TARGET_CONNECTION,
                        waited_ms = waited.as_millis() as u64,
                        "Slow connection checkout"
                    );
                }
                Ok(conn)
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET_CONNECTION,
                    waited_ms = waited.as_millis() as u64,
                    error = %error,
                    "Connection checkout failed"
                );
                Err(PgError::from(error))
            }
        }
    }

    /// Checks out a bare pooled connection for the migration harness.
    pub(crate) async fn get_pooled_connection(&self) -> PgResult<PooledConnection> {
        self.checkout().await
    }

    pub fn pool_status(&self) -> PgPoolStatus {
        self.inner.pool.status().into()
    }

    /// Configuration the pool was built from.
    pub fn config(&self) -> &PgConfig {
        &self.inner.config
    }
}

impl fmt::Debug for PgClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgClient")
            .field("url", &self.inner.config.database_url_masked())
            .field("pool", &self.pool_status())
            .finish()
    }
}

/// A pooled connection, returned to the pool on drop.
///
/// Derefs to [`PgConnection`], so every repository trait of
/// [`query`](crate::query) is callable on it.
///
/// ```ignore
/// let mut conn = pg_client.get_connection().await?;
/// let comment = conn.find_comment_by_id(comment_id).await?;
/// ```
///
/// [`PgConnection`]: crate::PgConnection
#[derive(Deref, DerefMut)]
pub struct PgConn {
    #[deref]
    #[deref_mut]
    conn: PooledConnection,
}

impl fmt::Debug for PgConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConn").finish_non_exhaustive()
    }
}
