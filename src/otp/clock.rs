//! Injected time source so expiry is deterministic under test.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Time source consulted at issuance (to stamp `expires_at`) and at
/// verification (to judge it).
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Production clock backed by `Instant::now`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Test clock: a fixed base plus an offset that only moves forward when
/// `advance` is called.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward by `step`.
    ///
    /// # Panics
    /// Panics if the internal lock is poisoned, which only happens after a
    /// panic inside another `advance`/`now` call on the same clock.
    pub fn advance(&self, step: Duration) {
        let mut offset = self.offset.lock().expect("clock lock poisoned");
        *offset += step;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().expect("clock lock poisoned");
        self.base + *offset
    }
}
