use brokerage_core::Timestamp;
use brokerage_ports::Clock;
use chrono::{Duration, Utc};
use std::sync::RwLock;

/// Clock that only advances when explicitly moved
///
/// Orders stamped from this clock keep a stable, test-controlled ordering.
pub struct ManualClock {
    current_time: RwLock<Timestamp>,
}

impl ManualClock {
    /// Create a new manual clock
    ///
    /// # Arguments
    /// * `initial_time` - Optional starting time. If None, uses current wall time.
    pub fn new(initial_time: Option<Timestamp>) -> Self {
        Self {
            current_time: RwLock::new(initial_time.unwrap_or_else(Utc::now)),
        }
    }

    /// Move time forward by `duration`
    pub fn advance(&self, duration: Duration) {
        let mut guard = self
            .current_time
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard += duration;
    }

    /// Explicitly set the current time
    pub fn set_time(&self, time: Timestamp) {
        let mut guard = self
            .current_time
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = time;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self
            .current_time
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn name(&self) -> &str {
        "ManualClock"
    }
}
