//! Event queue keys with deterministic ordering.

use std::cmp::Ordering;
use std::time::Duration;

/// Key for ordering callbacks in the queue.
///
/// Callbacks are ordered by:
/// 1. Time (earlier first)
/// 2. Sequence number (FIFO for callbacks submitted for the same instant)
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct EventKey {
    /// When this callback should fire.
    pub time: Duration,
    /// Submission counter, unique per clock.
    pub sequence: u64,
}

impl EventKey {
    pub fn new(time: Duration, sequence: u64) -> Self {
        Self { time, sequence }
    }
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.cmp(&other.time) {
            Ordering::Equal => self.sequence.cmp(&other.sequence),
            ord => ord,
        }
    }
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
