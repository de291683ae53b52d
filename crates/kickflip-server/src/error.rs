//! Startup and wiring errors of the server.
//!
//! Request-level failures use [`handler::Error`] instead; this type covers
//! what can go wrong before the router is serving.
//!
//! [`handler::Error`]: crate::handler::Error

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Type alias for Results with the server [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of server wiring failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid configuration values.
    Config,
    /// A backing service could not be reached or prepared.
    External,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// Returns the kind as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::External => "external_service",
            Self::Internal => "internal_service",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server wiring error with an optional source.
#[derive(Debug, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxedError>,
}

impl Error {
    #[inline]
    fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying cause.
    #[inline]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    #[must_use]
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Creates an error for a backing service, prefixed with its name.
    #[inline]
    pub fn external(
        service: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        let message = format!("{}: {}", service.into(), message.into());
        Self::new(ErrorKind::External, message)
    }

    /// Creates an internal error.
    #[inline]
    pub fn internal(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn external_error_names_the_service() {
        let error = Error::external("postgres", "migrations failed");
        assert_eq!(error.kind(), ErrorKind::External);
        assert_eq!(error.message(), "postgres: migrations failed");
        assert_eq!(
            error.to_string(),
            "external_service error: postgres: migrations failed"
        );
    }

    #[test]
    fn source_is_exposed() {
        let io = std::io::Error::other("refused");
        let error = Error::config("bad url").with_source(io);
        assert!(error.source().is_some());
    }
}
