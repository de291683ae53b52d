//! Error types and utilities for database operations.
//!
//! This module provides error handling for all database operations,
//! including connection errors, query errors, migration errors, and timeout errors.

use std::borrow::Cow;

use deadpool::managed::TimeoutType;
use diesel::result::{ConnectionError, DatabaseErrorKind, Error};
use diesel_async::pooled_connection::PoolError as DieselPoolError;
use diesel_async::pooled_connection::deadpool::PoolError as DeadpoolError;

use crate::types::CommentConstraints;

/// Type-erased error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for all PostgreSQL database operations.
///
/// This enum covers the failure conditions that can occur when working
/// with the database, including connection issues, query failures, timeouts,
/// and migration problems.
#[derive(Debug, thiserror::Error)]
#[must_use = "database errors should be handled appropriately"]
pub enum PgError {
    /// Configuration error.
    ///
    /// This includes invalid configuration parameters, missing required settings,
    /// or other issues related to the database configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database operation timed out.
    ///
    /// This can occur during connection creation, waiting for available connections,
    /// or connection recycling operations.
    #[error("Database operation timed out")]
    Timeout(TimeoutType),

    /// Failed to establish or maintain a database connection.
    #[error("Database connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Database migration operation failed.
    #[error("Database migration error: {0}")]
    Migration(BoxError),

    /// Database query execution failed.
    ///
    /// This includes SQL syntax errors, constraint violations, type mismatches,
    /// and other query-related failures.
    #[error("Database query error: {0}")]
    Query(#[from] Error),

    /// Unexpected error occurred.
    #[error("Unexpected error: {0}")]
    Unexpected(Cow<'static, str>),
}

impl PgError {
    /// Extracts the constraint name from a constraint violation error.
    ///
    /// # Returns
    ///
    /// - `Some(constraint_name)` if this error represents a constraint violation
    /// - `None` if this error is not related to a constraint violation
    pub fn constraint(&self) -> Option<&str> {
        let PgError::Query(err) = self else {
            return None;
        };

        let Error::DatabaseError(_, err) = err else {
            return None;
        };

        err.constraint_name()
    }

    /// Returns the violated `comments` table constraint, if any.
    pub fn comment_constraint(&self) -> Option<CommentConstraints> {
        self.constraint().and_then(CommentConstraints::new)
    }

    /// Returns whether this error indicates a transient failure that might succeed on retry.
    ///
    /// Transient errors include timeouts and broken or closed connections.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PgError::Timeout(_)
                | PgError::Connection(ConnectionError::BadConnection(_))
                | PgError::Query(Error::DatabaseError(
                    DatabaseErrorKind::ClosedConnection,
                    _
                ))
        )
    }

    /// Returns whether this error indicates a permanent failure that won't succeed on retry.
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Returns whether the statement was rejected by the data it touched
    /// rather than by the database being unreachable.
    fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            PgError::Query(Error::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation
                    | DatabaseErrorKind::CheckViolation
                    | DatabaseErrorKind::NotNullViolation,
                _
            ))
        )
    }
}

impl From<DeadpoolError> for PgError {
    fn from(value: DeadpoolError) -> Self {
        match value {
            DeadpoolError::Timeout(timeout) => Self::Timeout(timeout),
            DeadpoolError::Backend(DieselPoolError::QueryError(error)) => Self::Query(error),
            DeadpoolError::Backend(DieselPoolError::ConnectionError(error)) => {
                Self::Connection(error)
            }
            DeadpoolError::PostCreateHook(err) => {
                tracing::warn!("Unexpected post-create hook error: {}", err);
                Self::Unexpected(err.to_string().into())
            }
            DeadpoolError::NoRuntimeSpecified => {
                tracing::error!("No tokio runtime specified for connection pool");
                Self::Unexpected("No runtime specified".into())
            }
            DeadpoolError::Closed => Self::Connection(ConnectionError::InvalidConnectionUrl(
                "Connection pool is closed".into(),
            )),
        }
    }
}

impl From<PgError> for kickflip_core::Error {
    fn from(value: PgError) -> Self {
        use kickflip_core::Error as CoreError;

        let error = match &value {
            PgError::Timeout(_) | PgError::Connection(_) => CoreError::store_unavailable(),
            _ if value.is_transient() => CoreError::store_unavailable(),
            PgError::Query(Error::NotFound) => CoreError::not_found(),
            _ if value.is_rejected_input() => {
                let message = match value.comment_constraint() {
                    Some(constraint) => constraint.describe().to_owned(),
                    None => value.to_string(),
                };
                CoreError::invalid_input().with_message(message)
            }
            _ => CoreError::internal(),
        };

        error.with_source(value)
    }
}

/// Specialized [`Result`] type for database operations.
pub type PgResult<T, E = PgError> = Result<T, E>;

#[cfg(test)]
mod tests {
    use kickflip_core::ErrorKind;

    use super::*;

    #[test]
    fn timeouts_are_store_outages() {
        let error = PgError::Timeout(TimeoutType::Wait);
        assert!(error.is_transient());

        let error = kickflip_core::Error::from(error);
        assert_eq!(error.kind(), ErrorKind::StoreUnavailable);
        assert!(error.is_retryable());
    }

    #[test]
    fn bad_connections_are_store_outages() {
        let error = PgError::Connection(ConnectionError::BadConnection("reset".into()));
        assert!(error.is_transient());

        let error = kickflip_core::Error::from(error);
        assert_eq!(error.kind(), ErrorKind::StoreUnavailable);
    }

    #[test]
    fn missing_rows_are_not_found() {
        let error = kickflip_core::Error::from(PgError::Query(Error::NotFound));
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn config_errors_are_internal() {
        let error = PgError::Config("bad".into());
        assert!(error.is_permanent());
        assert_eq!(error.constraint(), None);

        let error = kickflip_core::Error::from(error);
        assert_eq!(error.kind(), ErrorKind::Internal);
    }
}
