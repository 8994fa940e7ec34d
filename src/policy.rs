use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Attempt budget and inter-attempt sleep for one wait.
///
/// The budget bounds total work: a wait always terminates within
/// `max_attempts * (interval + sample latency)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 40,
            interval: Duration::from_secs(1),
        }
    }
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Zero-interval policy. Attempts run back to back; the budget alone
    /// bounds the wait.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            interval: Duration::ZERO,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}
