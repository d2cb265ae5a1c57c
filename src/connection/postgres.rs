//! PostgreSQL client adapter built on `tokio-postgres`.

use super::observer::LOG_TARGET;
use crate::core::ConnectFailure;
use crate::interface::AsyncConnector;
use async_trait::async_trait;
use log::warn;
use std::io;
use tokio_postgres::error::SqlState;
use tokio_postgres::tls::{MakeTlsConnect, TlsConnect};
use tokio_postgres::{Client, NoTls, Socket};

/// SQLSTATEs a managed PostgreSQL service returns while it is saturated,
/// restarting, or dropping the socket.
fn is_transient_state(code: &SqlState) -> bool {
    matches!(
        code.code(),
        // too_many_connections
        "53300"
        // cannot_connect_now, admin_shutdown, crash_shutdown
        | "57P03" | "57P01" | "57P02"
        // class 08: connection exceptions
        | "08000" | "08003" | "08006" | "08001"
    )
}

/// Whether a failure with these traits is worth another attempt.
///
/// Split out from [`classify_pg_error`] because `tokio_postgres::Error` cannot
/// be built outside the driver.
pub fn is_retryable_failure(
    code: Option<&SqlState>,
    closed: bool,
    io_sourced: bool,
    message: &str,
) -> bool {
    if let Some(code) = code {
        return is_transient_state(code) || mentions_rate_limit(message);
    }

    let message = message.to_lowercase();
    closed
        || io_sourced
        || message.contains("rate limit")
        || message.contains("timeout")
        || message.contains("timed out")
}

fn mentions_rate_limit(message: &str) -> bool {
    message.to_lowercase().contains("rate limit")
}

/// Tag a driver error as `Retryable` or `Fatal`.
pub fn classify_pg_error(err: tokio_postgres::Error) -> ConnectFailure<tokio_postgres::Error> {
    let io_sourced = std::error::Error::source(&err).is_some_and(|source| source.is::<io::Error>());

    let mut message = err.to_string();
    if let Some(db) = err.as_db_error() {
        message.push(' ');
        message.push_str(db.message());
    }

    if is_retryable_failure(err.code(), err.is_closed(), io_sourced, &message) {
        ConnectFailure::Retryable(err)
    } else {
        ConnectFailure::Fatal(err)
    }
}

/// Live PostgreSQL session.
///
/// `tokio-postgres` never opens a transaction implicitly: every statement
/// outside `Client::transaction` commits on its own.
pub struct PgConnection {
    client: Client,
    autocommit: bool,
}

impl PgConnection {
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    pub fn into_client(self) -> Client {
        self.client
    }

    pub fn is_autocommit(&self) -> bool {
        self.autocommit
    }

    pub fn is_closed(&self) -> bool {
        self.client.is_closed()
    }

    /// Round-trip a trivial statement.
    pub async fn ping(&self) -> Result<(), tokio_postgres::Error> {
        self.client.simple_query("SELECT 1").await.map(|_| ())
    }
}

/// Opens [`PgConnection`]s; TLS is pluggable, plain TCP by default.
#[derive(Debug, Clone)]
pub struct PgConnector<T = NoTls> {
    tls: T,
}

impl PgConnector<NoTls> {
    pub fn new() -> Self {
        Self { tls: NoTls }
    }
}

impl Default for PgConnector<NoTls> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PgConnector<T> {
    pub fn with_tls(tls: T) -> Self {
        Self { tls }
    }
}

#[async_trait]
impl<T> AsyncConnector for PgConnector<T>
where
    T: MakeTlsConnect<Socket> + Clone + Send + Sync + 'static,
    T::Stream: Send + Sync + 'static,
    T::TlsConnect: Send + Sync,
    <T::TlsConnect as TlsConnect<Socket>>::Future: Send,
{
    type Connection = PgConnection;
    type Error = tokio_postgres::Error;

    async fn connect(&self, address: &str) -> Result<PgConnection, ConnectFailure<tokio_postgres::Error>> {
        let (client, connection) = tokio_postgres::connect(address, self.tls.clone())
            .await
            .map_err(classify_pg_error)?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(target: LOG_TARGET, "PostgreSQL connection closed with error: {}", e);
            }
        });

        Ok(PgConnection {
            client,
            autocommit: false,
        })
    }

    async fn enable_autocommit(
        &self,
        connection: &mut PgConnection,
    ) -> Result<(), ConnectFailure<tokio_postgres::Error>> {
        // Nothing to switch on the wire; confirm the session answers before
        // handing it out.
        connection.ping().await.map_err(classify_pg_error)?;
        connection.autocommit = true;
        Ok(())
    }
}
