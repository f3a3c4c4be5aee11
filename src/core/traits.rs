//! Core traits for the ledger engine
//!
//! The engine asks a [`Clock`] for the timestamp of every operation, so the
//! same code runs against wall-clock time in production and a pinned time in
//! tests and replays.

use chrono::{DateTime, Duration, Utc};
use std::fmt::Debug;
use std::sync::Mutex;

/// Source of operation timestamps
///
/// Implementations must be shareable across threads: the async facade runs
/// operations on the blocking pool.
pub trait Clock: Debug + Send + Sync {
    /// Current instant used as `created_at` / `executed_at`
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        FixedClock {
            now: Mutex::new(now),
        }
    }

    /// Move the clock to `now`
    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    /// Move the clock forward by `step`
    pub fn advance(&self, step: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += step;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        // A poisoned lock still holds the last value set.
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
