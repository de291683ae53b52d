//! Extension trait adding migration management to [`PgClient`].

use std::future::Future;

use super::{get_migration_status, run_pending_migrations, verify_schema_integrity};
use crate::{MigrationResult, MigrationStatus, PgClient, PgResult};

/// Migration management for [`PgClient`].
pub trait PgClientMigrationExt {
    /// Applies every pending migration. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns an error if any migration fails to apply or if there are
    /// connectivity issues with the database.
    fn run_pending_migrations(&self) -> impl Future<Output = PgResult<MigrationResult>> + Send;

    /// Reports which embedded migrations are applied and which are pending.
    fn get_migration_status(&self) -> impl Future<Output = PgResult<MigrationStatus>> + Send;

    /// Checks that the migration bookkeeping table exists.
    fn verify_schema_integrity(&self) -> impl Future<Output = PgResult<()>> + Send;
}

impl PgClientMigrationExt for PgClient {
    async fn run_pending_migrations(&self) -> PgResult<MigrationResult> {
        run_pending_migrations(self).await
    }

    async fn get_migration_status(&self) -> PgResult<MigrationStatus> {
        let mut conn = self.get_connection().await?;
        get_migration_status(&mut conn).await
    }

    async fn verify_schema_integrity(&self) -> PgResult<()> {
        let mut conn = self.get_connection().await?;
        verify_schema_integrity(&mut conn).await
    }
}
