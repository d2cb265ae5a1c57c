//! Bounded, jittered reconnect loop.
//!
//! Each call to `establish` walks the same state machine: try, and on a
//! retryable failure count it, wait `factor * 2^n + jitter`, and try again
//! until the attempt ceiling is reached. Fatal failures leave on the spot.
//! No state survives between calls.

use super::backoff::{AsyncSleeper, BackoffSchedule, Sleeper, ThreadSleeper, TokioSleeper};
use super::config::ConnectionConfig;
use super::observer::{ConnectObserver, LogObserver};
use crate::core::{ConnectFailure, Result};
use crate::interface::{AsyncConnector, Connector};
use std::fmt::Display;
use std::time::Duration;

/// Attempt bookkeeping for a single establishment call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AttemptState {
    attempts: u32,
    max_attempts: u32,
}

impl AttemptState {
    fn new(max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
        }
    }

    /// Count `failure` and decide what happens next.
    ///
    /// `Ok(delay)` means wait and try again; `Err` hands the failure back to
    /// the caller untouched.
    fn record_failure<E, O>(
        &mut self,
        failure: ConnectFailure<E>,
        schedule: &BackoffSchedule,
        observer: &O,
    ) -> std::result::Result<Duration, ConnectFailure<E>>
    where
        E: Display,
        O: ConnectObserver + ?Sized,
    {
        if !failure.is_retryable() {
            return Err(failure);
        }

        self.attempts += 1;
        let cause = failure.cause();
        if self.attempts >= self.max_attempts {
            observer.error(&format!(
                "Failed to connect to database after {} attempts. Last error: {}",
                self.max_attempts, cause
            ));
            return Err(failure);
        }

        let delay = schedule.delay(self.attempts);
        if is_rate_limited(cause) {
            observer.warn(&format!(
                "Hit database rate limit, retrying in {:.2} seconds (attempt {}/{})",
                delay.as_secs_f64(),
                self.attempts,
                self.max_attempts
            ));
        } else {
            observer.warn(&format!(
                "Database connection error: {}. Retrying in {:.2} seconds (attempt {}/{})",
                cause,
                delay.as_secs_f64(),
                self.attempts,
                self.max_attempts
            ));
        }
        Ok(delay)
    }

    fn report_success<O: ConnectObserver + ?Sized>(&self, observer: &O) {
        observer.info(&format!(
            "Successfully connected to database (attempt {}/{})",
            self.attempts + 1,
            self.max_attempts
        ));
    }
}

/// Case-insensitive "rate limit" check; only changes the log wording.
pub fn is_rate_limited<E: Display + ?Sized>(cause: &E) -> bool {
    cause.to_string().to_lowercase().contains("rate limit")
}

/// Blocking establisher.
///
/// ```ignore
/// let config = ConnectionConfig::from_env()?;
/// let establisher = ConnectionEstablisher::new(connector, &config)?;
/// let conn = establisher.establish(&config.url)?;
/// ```
pub struct ConnectionEstablisher<C, O = LogObserver, S = ThreadSleeper> {
    connector: C,
    schedule: BackoffSchedule,
    max_attempts: u32,
    observer: O,
    sleeper: S,
}

impl<C> ConnectionEstablisher<C> {
    /// Build an establisher with the retry policy from `config`.
    pub fn new(connector: C, config: &ConnectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            connector,
            schedule: BackoffSchedule::from_config(config),
            max_attempts: config.max_attempts,
            observer: LogObserver,
            sleeper: ThreadSleeper,
        })
    }
}

impl<C, O, S> ConnectionEstablisher<C, O, S> {
    pub fn with_observer<O2: ConnectObserver>(self, observer: O2) -> ConnectionEstablisher<C, O2, S> {
        ConnectionEstablisher {
            connector: self.connector,
            schedule: self.schedule,
            max_attempts: self.max_attempts,
            observer,
            sleeper: self.sleeper,
        }
    }

    pub fn with_sleeper<S2: Sleeper>(self, sleeper: S2) -> ConnectionEstablisher<C, O, S2> {
        ConnectionEstablisher {
            connector: self.connector,
            schedule: self.schedule,
            max_attempts: self.max_attempts,
            observer: self.observer,
            sleeper,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn schedule(&self) -> &BackoffSchedule {
        &self.schedule
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl<C, O, S> ConnectionEstablisher<C, O, S>
where
    C: Connector,
    C::Error: Display,
    O: ConnectObserver,
    S: Sleeper,
{
    /// Open an autocommit connection to `address`, retrying transient failures.
    ///
    /// On exhaustion the last retryable failure is returned as-is.
    pub fn establish(
        &self,
        address: &str,
    ) -> std::result::Result<C::Connection, ConnectFailure<C::Error>> {
        let mut state = AttemptState::new(self.max_attempts);
        loop {
            let failure = match self.attempt(address) {
                Ok(connection) => {
                    state.report_success(&self.observer);
                    return Ok(connection);
                }
                Err(failure) => failure,
            };

            let delay = state.record_failure(failure, &self.schedule, &self.observer)?;
            self.sleeper.sleep(delay);
        }
    }

    fn attempt(&self, address: &str) -> std::result::Result<C::Connection, ConnectFailure<C::Error>> {
        let mut connection = self.connector.connect(address)?;
        self.connector.enable_autocommit(&mut connection)?;
        Ok(connection)
    }
}

/// Cooperative establisher: backoff is an awaited timer instead of a blocked thread.
pub struct AsyncConnectionEstablisher<C, O = LogObserver, S = TokioSleeper> {
    connector: C,
    schedule: BackoffSchedule,
    max_attempts: u32,
    observer: O,
    sleeper: S,
}

impl<C> AsyncConnectionEstablisher<C> {
    pub fn new(connector: C, config: &ConnectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            connector,
            schedule: BackoffSchedule::from_config(config),
            max_attempts: config.max_attempts,
            observer: LogObserver,
            sleeper: TokioSleeper,
        })
    }
}

impl<C, O, S> AsyncConnectionEstablisher<C, O, S> {
    pub fn with_observer<O2: ConnectObserver>(
        self,
        observer: O2,
    ) -> AsyncConnectionEstablisher<C, O2, S> {
        AsyncConnectionEstablisher {
            connector: self.connector,
            schedule: self.schedule,
            max_attempts: self.max_attempts,
            observer,
            sleeper: self.sleeper,
        }
    }

    pub fn with_sleeper<S2: AsyncSleeper>(self, sleeper: S2) -> AsyncConnectionEstablisher<C, O, S2> {
        AsyncConnectionEstablisher {
            connector: self.connector,
            schedule: self.schedule,
            max_attempts: self.max_attempts,
            observer: self.observer,
            sleeper,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn schedule(&self) -> &BackoffSchedule {
        &self.schedule
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl<C, O, S> AsyncConnectionEstablisher<C, O, S>
where
    C: AsyncConnector,
    C::Error: Display,
    O: ConnectObserver,
    S: AsyncSleeper,
{
    /// Async version of [`ConnectionEstablisher::establish`], same guarantees.
    pub async fn establish(
        &self,
        address: &str,
    ) -> std::result::Result<C::Connection, ConnectFailure<C::Error>> {
        let mut state = AttemptState::new(self.max_attempts);
        loop {
            let failure = match self.attempt(address).await {
                Ok(connection) => {
                    state.report_success(&self.observer);
                    return Ok(connection);
                }
                Err(failure) => failure,
            };

            let delay = state.record_failure(failure, &self.schedule, &self.observer)?;
            self.sleeper.sleep(delay).await;
        }
    }

    async fn attempt(
        &self,
        address: &str,
    ) -> std::result::Result<C::Connection, ConnectFailure<C::Error>> {
        let mut connection = self.connector.connect(address).await?;
        self.connector.enable_autocommit(&mut connection).await?;
        Ok(connection)
    }
}
