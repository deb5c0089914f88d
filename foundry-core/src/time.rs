//! Injectable clock for poll/retry loops.
//!
//! Every sleep-and-retry loop in the workspace (lock polling, upload
//! retries, upload pacing) goes through [`Clock`], so tests can simulate
//! elapsed time without real delays.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Time source and sleeper.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&self, duration: Duration);
}

/// Production clock: `Utc::now()` + `thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deterministic clock for tests.
///
/// `sleep` records the requested duration and advances the current time by
/// it, so a polling loop with a wait budget terminates without real delays.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Move the clock forward without recording a sleep.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock poisoned");
        *now += chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
    }

    /// Every duration passed to `sleep`, in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("clock poisoned").clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock poisoned")
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().expect("clock poisoned").push(duration);
        self.advance(duration);
    }
}
