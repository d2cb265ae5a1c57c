use crate::core::ConnectFailure;
use async_trait::async_trait;

/// A blocking data-store client adapter.
///
/// Implementations own the retry classification: every failure comes back
/// tagged as `Retryable` or `Fatal`, and the establisher only ever matches on
/// that tag. The address is handed through untouched.
pub trait Connector {
    type Connection;
    type Error;

    /// Open a fresh connection to `address`.
    fn connect(&self, address: &str) -> Result<Self::Connection, ConnectFailure<Self::Error>>;

    /// Put the connection in autocommit mode so no implicit transaction stays open.
    fn enable_autocommit(
        &self,
        connection: &mut Self::Connection,
    ) -> Result<(), ConnectFailure<Self::Error>>;
}

/// Async counterpart of [`Connector`] for cooperative runtimes.
#[async_trait]
pub trait AsyncConnector: Send + Sync {
    type Connection: Send;
    type Error: Send;

    async fn connect(&self, address: &str) -> Result<Self::Connection, ConnectFailure<Self::Error>>;

    async fn enable_autocommit(
        &self,
        connection: &mut Self::Connection,
    ) -> Result<(), ConnectFailure<Self::Error>>;
}
