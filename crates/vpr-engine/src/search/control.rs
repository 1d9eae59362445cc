//! Search control: stop flag and time budget.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How often, in nodes, the search consults the clock.
pub const CHECK_INTERVAL: u64 = 1024;

/// Controls when a search should stop.
///
/// The external stop flag is observed on every check; the clock only every
/// [`CHECK_INTERVAL`] nodes. A `None` limit means the search runs until the
/// depth limit or the stop flag ends it.
pub struct SearchControl {
    stopped: Arc<AtomicBool>,
    start: Instant,
    limit: Option<Duration>,
}

impl SearchControl {
    /// Control with an optional time limit; the clock starts now.
    pub fn new(stopped: Arc<AtomicBool>, limit: Option<Duration>) -> Self {
        Self {
            stopped,
            start: Instant::now(),
            limit,
        }
    }

    /// Control without a time limit (`go infinite`, fixed depth).
    pub fn new_infinite(stopped: Arc<AtomicBool>) -> Self {
        Self::new(stopped, None)
    }

    /// Control with a time limit; the clock starts now.
    pub fn new_timed(stopped: Arc<AtomicBool>, limit: Duration) -> Self {
        Self::new(stopped, Some(limit))
    }

    /// Check whether the search should abort.
    ///
    /// When the time limit fires, the stop flag is set so every later call
    /// returns immediately.
    pub fn should_stop(&self, nodes: u64) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return true;
        }
        if nodes % CHECK_INTERVAL != 0 {
            return false;
        }
        self.time_exceeded()
    }

    /// Check the clock now, regardless of node count.
    pub fn time_exceeded(&self) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return true;
        }
        match self.limit {
            Some(limit) if self.elapsed() >= limit => {
                self.stopped.store(true, Ordering::Release);
                true
            }
            _ => false,
        }
    }

    /// Raise the stop flag.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
