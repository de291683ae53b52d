//! Hooks run around the migration harness.

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::PoolableConnection;

use crate::{PgError, PgResult, TRACING_TARGET_MIGRATION};

/// Refuses to hand a broken connection to the migration harness.
pub async fn pre_migrate(conn: &mut AsyncPgConnection) -> PgResult<()> {
    if conn.is_broken() {
        tracing::error!(
            target: TRACING_TARGET_MIGRATION,
            hook = "pre_migrate",
            "Connection is broken before migrations"
        );
        return Err(PgError::Migration(
            "connection is broken before migrations".into(),
        ));
    }

    tracing::debug!(
        target: TRACING_TARGET_MIGRATION,
        hook = "pre_migrate",
        "Preparing to run database migrations"
    );
    Ok(())
}

/// Logs the state of the connection once the harness returned it.
pub async fn post_migrate(conn: &mut AsyncPgConnection) -> PgResult<()> {
    if conn.is_broken() {
        tracing::error!(
            target: TRACING_TARGET_MIGRATION,
            hook = "post_migrate",
            "Connection is broken after migrations"
        );
    } else {
        tracing::debug!(
            target: TRACING_TARGET_MIGRATION,
            hook = "post_migrate",
            "Database migrations completed"
        );
    }

    Ok(())
}
