use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Recipe {0} not found")]
    RecipeNotFound(i64),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

impl From<tokio_postgres::Error> for CatalogError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::QueryError(err.to_string())
    }
}

/// Classified failure reported by a client adapter.
///
/// The establisher only retries `Retryable`; a `Fatal` failure is handed back
/// to the caller on the attempt that produced it. Either way the adapter's own
/// error value travels unchanged, so callers can inspect the original cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectFailure<E> {
    /// Connection-level trouble expected to clear up (rate limits, restarts, refused sockets).
    Retryable(E),
    /// Anything else: bad credentials, malformed address, unknown database.
    Fatal(E),
}

impl<E> ConnectFailure<E> {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }

    pub fn cause(&self) -> &E {
        match self {
            Self::Retryable(err) | Self::Fatal(err) => err,
        }
    }

    pub fn into_cause(self) -> E {
        match self {
            Self::Retryable(err) | Self::Fatal(err) => err,
        }
    }

    pub fn map<F, T>(self, f: F) -> ConnectFailure<T>
    where
        F: FnOnce(E) -> T,
    {
        match self {
            Self::Retryable(err) => ConnectFailure::Retryable(f(err)),
            Self::Fatal(err) => ConnectFailure::Fatal(f(err)),
        }
    }
}

impl<E: fmt::Display> fmt::Display for ConnectFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Same text as the cause: exhaustion must surface the client's message verbatim.
        fmt::Display::fmt(self.cause(), f)
    }
}

impl<E> StdError for ConnectFailure<E>
where
    E: StdError + 'static,
{
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.cause())
    }
}

impl<E: fmt::Display> From<ConnectFailure<E>> for CatalogError {
    fn from(failure: ConnectFailure<E>) -> Self {
        Self::ConnectionError(failure.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_failure_keeps_cause_text() {
        let failure = ConnectFailure::Retryable(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));

        assert!(failure.is_retryable());
        assert_eq!(failure.to_string(), "connection refused");
        assert!(failure.source().is_some());
    }

    #[test]
    fn test_into_cause_returns_original_value() {
        let failure: ConnectFailure<String> = ConnectFailure::Fatal("password authentication failed".into());
        assert!(!failure.is_retryable());
        assert_eq!(failure.into_cause(), "password authentication failed");
    }

    #[test]
    fn test_map_preserves_variant() {
        let failure: ConnectFailure<&str> = ConnectFailure::Retryable("rate limit");
        let mapped = failure.map(|s| s.len());
        assert!(mapped.is_retryable());
        assert_eq!(*mapped.cause(), 10);
    }

    #[test]
    fn test_catalog_error_from_failure() {
        let failure: ConnectFailure<String> = ConnectFailure::Fatal("no such database".into());
        let err: CatalogError = failure.into();
        assert_eq!(err.to_string(), "Connection error: no such database");
    }
}
