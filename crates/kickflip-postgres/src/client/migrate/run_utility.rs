use diesel::migration::MigrationSource;
use diesel::pg::Pg;
use diesel::sql_types::{Bool, Text};
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use super::MigrationStatus;
use crate::{MIGRATIONS, PgError, PgResult, TRACING_TARGET_MIGRATION};

/// Tables the comment store cannot work without.
const REQUIRED_TABLES: [&str; 4] = ["users", "posts", "comments", "notifications"];

#[derive(diesel::QueryableByName)]
struct Exists {
    #[diesel(sql_type = Bool)]
    exists: bool,
}

async fn table_exists(conn: &mut AsyncPgConnection, table: &str) -> PgResult<bool> {
    let row: Exists = diesel::sql_query(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = current_schema() AND table_name = $1
         ) AS exists",
    )
    .bind::<Text, _>(table)
    .get_result(conn)
    .await
    .map_err(PgError::from)?;

    Ok(row.exists)
}

/// Lists the versions of every embedded migration.
fn embedded_versions() -> PgResult<Vec<String>> {
    let migrations = MigrationSource::<Pg>::migrations(&MIGRATIONS).map_err(PgError::Migration)?;
    let mut versions: Vec<String> = migrations
        .iter()
        .map(|migration| migration.name().version().to_string())
        .collect();

    versions.sort();
    Ok(versions)
}

/// Compares the embedded migrations against the ones recorded in the database.
#[tracing::instrument(skip(conn), target = TRACING_TARGET_MIGRATION)]
pub async fn get_migration_status(conn: &mut AsyncPgConnection) -> PgResult<MigrationStatus> {
    let applied_versions = get_applied_migrations(conn).await?;
    let pending_versions: Vec<String> = embedded_versions()?
        .into_iter()
        .filter(|version| !applied_versions.contains(version))
        .collect();

    let status = MigrationStatus {
        applied_versions,
        pending_versions,
    };

    tracing::debug!(
        target: TRACING_TARGET_MIGRATION,
        applied_count = status.applied_migrations(),
        pending_count = status.pending_migrations(),
        "Migration status retrieved"
    );

    Ok(status)
}

/// Checks that migrations have run and created the comment tables.
#[tracing::instrument(skip(conn), target = TRACING_TARGET_MIGRATION)]
pub async fn verify_schema_integrity(conn: &mut AsyncPgConnection) -> PgResult<()> {
    if !table_exists(conn, "__diesel_schema_migrations").await? {
        tracing::warn!(
            target: TRACING_TARGET_MIGRATION,
            "Migration table does not exist, database may not be initialized"
        );
        return Err(PgError::Migration(
            "migration table __diesel_schema_migrations does not exist".into(),
        ));
    }

    for table in REQUIRED_TABLES {
        if !table_exists(conn, table).await? {
            return Err(PgError::Migration(
                format!("required table {table} does not exist").into(),
            ));
        }
    }

    tracing::info!(target: TRACING_TARGET_MIGRATION, "Database schema integrity verified");
    Ok(())
}

/// Lists applied migration versions. Empty on a fresh database.
#[tracing::instrument(skip(conn), target = TRACING_TARGET_MIGRATION)]
pub async fn get_applied_migrations(conn: &mut AsyncPgConnection) -> PgResult<Vec<String>> {
    #[derive(diesel::QueryableByName)]
    struct MigrationVersion {
        #[diesel(sql_type = Text)]
        version: String,
    }

    if !table_exists(conn, "__diesel_schema_migrations").await? {
        return Ok(Vec::new());
    }

    let versions = diesel::sql_query("SELECT version FROM __diesel_schema_migrations ORDER BY version")
        .get_results::<MigrationVersion>(conn)
        .await
        .map_err(|e| PgError::Migration(format!("failed to get applied migrations: {e}").into()))?
        .into_iter()
        .map(|row| row.version)
        .collect();

    Ok(versions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_migrations_are_listed() {
        let versions = embedded_versions().expect("embedded migrations should load");
        assert!(!versions.is_empty());
        assert!(versions.iter().all(|v| v.chars().all(|c| c.is_ascii_digit())));
    }
}
