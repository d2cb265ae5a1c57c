//! Backoff schedule and the sleepers that wait it out.
//!
//! The schedule is a pure function of the attempt number:
//! `factor * 2^attempt + uniform(0, jitter_ceiling)`. Jitter only ever adds,
//! so every delay sits in `[factor * 2^n, factor * 2^n + jitter_ceiling)`.

use super::config::ConnectionConfig;
use async_trait::async_trait;
use rand::{Rng, thread_rng};
use std::time::Duration;

// 2^1024 overflows f64; anything past this saturates anyway.
const MAX_EXPONENT: u32 = 1023;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffSchedule {
    factor: f64,
    jitter_ceiling: f64,
}

impl BackoffSchedule {
    pub fn new(factor: f64, jitter_ceiling: f64) -> Self {
        Self {
            factor,
            jitter_ceiling,
        }
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self::new(config.backoff_factor, config.jitter_ceiling)
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn jitter_ceiling(&self) -> f64 {
        self.jitter_ceiling
    }

    /// Deterministic part of the delay for `attempt`: `factor * 2^attempt`.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(MAX_EXPONENT) as i32;
        seconds_to_duration(self.factor * 2f64.powi(exponent))
    }

    /// Full delay for `attempt`, drawing jitter from `rng`.
    pub fn delay_with<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        // Jitter is drawn in whole nanoseconds so the upper bound stays exclusive
        // after conversion.
        let ceiling_nanos = seconds_to_duration(self.jitter_ceiling).as_nanos() as u64;
        let jitter = if ceiling_nanos > 0 {
            Duration::from_nanos(rng.gen_range(0..ceiling_nanos))
        } else {
            Duration::ZERO
        };
        self.base_delay(attempt).saturating_add(jitter)
    }

    /// Full delay for `attempt` using the thread-local RNG.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.delay_with(attempt, &mut thread_rng())
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::from_config(&ConnectionConfig::default())
    }
}

fn seconds_to_duration(secs: f64) -> Duration {
    if secs <= 0.0 || secs.is_nan() {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Blocks the calling thread between attempts.
pub trait Sleeper {
    fn sleep(&self, delay: Duration);
}

/// `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Suspends the current task between attempts.
#[async_trait]
pub trait AsyncSleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl AsyncSleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
