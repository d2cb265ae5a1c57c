#![allow(dead_code)]

use async_trait::async_trait;
use recipe_catalog::{AsyncConnector, AsyncSleeper, ConnectFailure, Connector, Sleeper};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct FakeError(pub String);

/// What the fake server does on one attempt.
#[derive(Debug, Clone)]
pub enum Step {
    Accept,
    Transient(&'static str),
    Fatal(&'static str),
    /// Socket opens but the session setup hits a transient error.
    AutocommitTransient(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeConnection {
    pub id: u32,
    pub address: String,
    pub autocommit: bool,
    fail_autocommit: Option<&'static str>,
}

/// Plays back a fixed script of outcomes, then repeats `fallback` forever.
pub struct ScriptedConnector {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    attempts: AtomicU32,
    opened: AtomicU32,
}

impl ScriptedConnector {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            fallback: Step::Accept,
            attempts: AtomicU32::new(0),
            opened: AtomicU32::new(0),
        }
    }

    pub fn always(step: Step) -> Self {
        Self {
            fallback: step,
            ..Self::new(Vec::new())
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> u32 {
        self.opened.load(Ordering::SeqCst)
    }

    fn open(&self, address: &str) -> Result<FakeConnection, ConnectFailure<FakeError>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        let fail_autocommit = match step {
            Step::Accept => None,
            Step::AutocommitTransient(msg) => Some(msg),
            Step::Transient(msg) => return Err(ConnectFailure::Retryable(FakeError(msg.into()))),
            Step::Fatal(msg) => return Err(ConnectFailure::Fatal(FakeError(msg.into()))),
        };

        let id = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(FakeConnection {
            id,
            address: address.to_string(),
            autocommit: false,
            fail_autocommit,
        })
    }

    fn configure(&self, connection: &mut FakeConnection) -> Result<(), ConnectFailure<FakeError>> {
        if let Some(msg) = connection.fail_autocommit {
            return Err(ConnectFailure::Retryable(FakeError(msg.into())));
        }
        connection.autocommit = true;
        Ok(())
    }
}

impl Connector for ScriptedConnector {
    type Connection = FakeConnection;
    type Error = FakeError;

    fn connect(&self, address: &str) -> Result<FakeConnection, ConnectFailure<FakeError>> {
        self.open(address)
    }

    fn enable_autocommit(&self, connection: &mut FakeConnection) -> Result<(), ConnectFailure<FakeError>> {
        self.configure(connection)
    }
}

#[async_trait]
impl AsyncConnector for ScriptedConnector {
    type Connection = FakeConnection;
    type Error = FakeError;

    async fn connect(&self, address: &str) -> Result<FakeConnection, ConnectFailure<FakeError>> {
        tokio::task::yield_now().await;
        self.open(address)
    }

    async fn enable_autocommit(
        &self,
        connection: &mut FakeConnection,
    ) -> Result<(), ConnectFailure<FakeError>> {
        self.configure(connection)
    }
}

/// Records requested delays instead of waiting them out.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, delay: Duration) {
        self.delays.lock().unwrap().push(delay);
    }
}

#[async_trait]
impl AsyncSleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        self.delays.lock().unwrap().push(delay);
    }
}

/// `[factor * 2^n, factor * 2^n + 0.5s)` for retry `n` (1-indexed).
pub fn assert_delay_in_window(delay: Duration, factor: f64, n: u32) {
    let floor = Duration::from_secs_f64(factor * 2f64.powi(n as i32));
    let ceiling = floor + Duration::from_millis(500);
    assert!(
        delay >= floor && delay < ceiling,
        "delay {:?} for retry {} outside [{:?}, {:?})",
        delay,
        n,
        floor,
        ceiling
    );
}
