//! What a migration run found and did.

use std::time::Duration;

/// Embedded migrations split by whether the database has recorded them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Recorded versions, oldest first.
    pub applied_versions: Vec<String>,
    /// Embedded versions the database has not recorded yet, oldest first.
    pub pending_versions: Vec<String>,
}

impl MigrationStatus {
    #[inline]
    pub fn applied_migrations(&self) -> usize {
        self.applied_versions.len()
    }

    #[inline]
    pub fn pending_migrations(&self) -> usize {
        self.pending_versions.len()
    }

    /// Returns the version the next run would apply first.
    pub fn next_pending_version(&self) -> Option<&str> {
        self.pending_versions.first().map(String::as_str)
    }

    /// Returns true when the comment schema needs no migration.
    #[inline]
    pub fn is_up_to_date(&self) -> bool {
        self.pending_versions.is_empty()
    }
}

/// Outcome of [`run_pending_migrations`](super::run_pending_migrations).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationResult {
    /// Wall time of the run, including the status lookup.
    pub duration: Duration,
    /// Versions applied by this run; empty when the schema was current.
    pub processed_versions: Vec<String>,
}

impl MigrationResult {
    pub(crate) fn new(duration: Duration, processed_versions: Vec<String>) -> Self {
        Self {
            duration,
            processed_versions,
        }
    }

    /// Returns whether the run found nothing to apply.
    pub fn is_no_op(&self) -> bool {
        self.processed_versions.is_empty()
    }
}
