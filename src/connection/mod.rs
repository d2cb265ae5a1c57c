pub mod backoff;
pub mod config;
pub mod establisher;
pub mod observer;
pub mod postgres;

pub use backoff::{AsyncSleeper, BackoffSchedule, Sleeper, ThreadSleeper, TokioSleeper};
pub use config::ConnectionConfig;
pub use establisher::{AsyncConnectionEstablisher, ConnectionEstablisher, is_rate_limited};
pub use observer::{ConnectObserver, EventLevel, LogObserver, RecordingObserver};
pub use postgres::{PgConnection, PgConnector, classify_pg_error};

