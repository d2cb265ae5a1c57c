use log::{error, info, warn};
use std::sync::{Arc, Mutex};

pub const LOG_TARGET: &str = "recipe_catalog::connection";

/// Sink for the establisher's progress events.
///
/// Injected instead of reaching for a global logger; the establisher only
/// emits, it never configures where events end up.
pub trait ConnectObserver {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards to the `log` facade under [`LOG_TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl ConnectObserver for LogObserver {
    fn info(&self, message: &str) {
        info!(target: LOG_TARGET, "{}", message);
    }

    fn warn(&self, message: &str) {
        warn!(target: LOG_TARGET, "{}", message);
    }

    fn error(&self, message: &str) {
        error!(target: LOG_TARGET, "{}", message);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

/// Keeps every event in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<(EventLevel, String)>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(EventLevel, String)> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn messages_at(&self, level: EventLevel) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }

    fn push(&self, level: EventLevel, message: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push((level, message.to_string()));
        }
    }
}

impl ConnectObserver for RecordingObserver {
    fn info(&self, message: &str) {
        self.push(EventLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(EventLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(EventLevel::Error, message);
    }
}

impl<T: ConnectObserver + ?Sized> ConnectObserver for Arc<T> {
    fn info(&self, message: &str) {
        (**self).info(message);
    }

    fn warn(&self, message: &str) {
        (**self).warn(message);
    }

    fn error(&self, message: &str) {
        (**self).error(message);
    }
}
