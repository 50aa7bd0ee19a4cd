//! Discrete-event time base.
//!
//! [`EventClock`] owns the pending callbacks of one simulation run and
//! dispatches them in non-decreasing time order. Callbacks submitted for the
//! same instant fire in submission order, which makes a run reproducible from
//! its configuration alone.
//!
//! The clock is generic over the state `S` that callbacks mutate. Callbacks
//! receive that state together with the clock, so they can schedule follow-up
//! work that becomes visible to the same `run` call.
//!
//! ```
//! use std::time::Duration;
//! use sinkholesim::clock::EventClock;
//!
//! let mut clock: EventClock<Vec<u64>> = EventClock::new();
//! clock.schedule(Duration::from_secs(2), |log, clock| {
//!     log.push(clock.now().as_secs());
//!     Ok(())
//! });
//! clock.schedule_periodic(Duration::from_secs(1), Duration::from_secs(1), |log, clock| {
//!     log.push(clock.now().as_secs() * 10);
//!     Ok(())
//! })?;
//!
//! let mut log = Vec::new();
//! clock.run(Duration::from_secs(3), &mut log)?;
//! assert_eq!(log, vec![10, 2, 20, 30]);
//! # Ok::<(), sinkholesim::SimError>(())
//! ```

pub mod event_queue;

use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, trace};

use crate::error::{SimError, SimResult};
use event_queue::EventKey;

/// One-shot callback
pub type Callback<S> = Box<dyn FnOnce(&mut S, &mut EventClock<S>) -> SimResult<()>>;

/// Callback of a periodic timer, invoked once per period
pub type PeriodicCallback<S> = Box<dyn FnMut(&mut S, &mut EventClock<S>) -> SimResult<()>>;

enum Task<S> {
    Once(Callback<S>),
    Periodic {
        interval: Duration,
        callback: PeriodicCallback<S>,
    },
}

/// Global discrete-event scheduler of a simulation run
pub struct EventClock<S> {
    now: Duration,
    sequence: u64,
    queue: BTreeMap<EventKey, Task<S>>,
    processed: u64,
}

impl<S> Default for EventClock<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> EventClock<S> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            sequence: 0,
            queue: BTreeMap::new(),
            processed: 0,
        }
    }

    /// Current logical time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of callbacks still pending
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of callbacks executed so far
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Schedule `callback` to fire at `now + delay`
    pub fn schedule<F>(&mut self, delay: Duration, callback: F) -> EventKey
    where
        F: FnOnce(&mut S, &mut EventClock<S>) -> SimResult<()> + 'static,
    {
        let at = self.now + delay;
        self.insert(at, Task::Once(Box::new(callback)))
    }

    /// Schedule `callback` to fire at `now + first_delay` and then every `interval`.
    ///
    /// The timer re-arms itself until the run horizon is reached or the clock
    /// is destroyed. A zero `interval` is rejected with [`SimError::ZeroInterval`]
    /// and nothing is scheduled.
    pub fn schedule_periodic<F>(&mut self, first_delay: Duration, interval: Duration, callback: F) -> SimResult<EventKey>
    where
        F: FnMut(&mut S, &mut EventClock<S>) -> SimResult<()> + 'static,
    {
        if interval.is_zero() {
            return Err(SimError::ZeroInterval);
        }
        let at = self.now + first_delay;
        Ok(self.insert(
            at,
            Task::Periodic {
                interval,
                callback: Box::new(callback),
            },
        ))
    }

    fn insert(&mut self, at: Duration, task: Task<S>) -> EventKey {
        self.sequence += 1;
        let key = EventKey::new(at, self.sequence);
        self.queue.insert(key, task);
        key
    }

    /// Execute callbacks in time order until none remains at or before `until`.
    ///
    /// The first callback error halts the run and is returned; callbacks that
    /// were not reached stay queued until [`EventClock::destroy`].
    pub fn run(&mut self, until: Duration, state: &mut S) -> SimResult<()> {
        debug!("Running clock until {:.3}s", until.as_secs_f64());

        while let Some((&key, _)) = self.queue.first_key_value() {
            if key.time > until {
                debug!("Horizon reached with {} callbacks pending", self.queue.len());
                break;
            }

            let Some((key, task)) = self.queue.pop_first() else {
                break;
            };
            self.now = key.time;
            self.processed += 1;
            trace!("Dispatching callback #{} at {:?}", key.sequence, key.time);

            match task {
                Task::Once(callback) => callback(state, self)?,
                Task::Periodic { interval, mut callback } => {
                    let result = callback(state, self);
                    self.insert(key.time + interval, Task::Periodic { interval, callback });
                    result?;
                }
            }
        }

        if self.now < until {
            self.now = until;
        }
        Ok(())
    }

    /// Drop all pending callbacks without executing them.
    ///
    /// Returns the number of callbacks dropped.
    pub fn destroy(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        debug!("Clock destroyed, {} pending callbacks dropped", dropped);
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_callbacks_fire_in_time_order() {
        let mut clock: EventClock<Vec<u64>> = EventClock::new();
        for t in [5, 1, 3] {
            clock.schedule(secs(t), move |log, _| {
                log.push(t);
                Ok(())
            });
        }

        let mut log = Vec::new();
        clock.run(secs(10), &mut log).unwrap();
        assert_eq!(log, vec![1, 3, 5]);
        assert_eq!(clock.now(), secs(10));
    }

    #[test]
    fn test_ties_fire_in_submission_order() {
        let mut clock: EventClock<Vec<&'static str>> = EventClock::new();
        clock.schedule(secs(1), |log, _| {
            log.push("first");
            Ok(())
        });
        clock.schedule(secs(1), |log, _| {
            log.push("second");
            Ok(())
        });
        clock.schedule(secs(1), |log, _| {
            log.push("third");
            Ok(())
        });

        let mut log = Vec::new();
        clock.run(secs(1), &mut log).unwrap();
        assert_eq!(log, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_callback_can_schedule_within_same_run() {
        let mut clock: EventClock<Vec<Duration>> = EventClock::new();
        clock.schedule(secs(1), |log, clock| {
            log.push(clock.now());
            clock.schedule(Duration::ZERO, |log, clock| {
                log.push(clock.now());
                Ok(())
            });
            clock.schedule(secs(2), |log, clock| {
                log.push(clock.now());
                Ok(())
            });
            Ok(())
        });

        let mut log = Vec::new();
        clock.run(secs(5), &mut log).unwrap();
        assert_eq!(log, vec![secs(1), secs(1), secs(3)]);
    }

    #[test]
    fn test_run_stops_at_horizon_inclusive() {
        let mut clock: EventClock<u32> = EventClock::new();
        clock.schedule(secs(50), |count, _| {
            *count += 1;
            Ok(())
        });
        clock.schedule(secs(51), |count, _| {
            *count += 100;
            Ok(())
        });

        let mut count = 0;
        clock.run(secs(50), &mut count).unwrap();
        assert_eq!(count, 1);
        assert_eq!(clock.pending(), 1);
    }

    #[test]
    fn test_periodic_timer_fires_until_horizon() {
        let mut clock: EventClock<Vec<u64>> = EventClock::new();
        clock
            .schedule_periodic(secs(5), secs(5), |log, clock| {
                log.push(clock.now().as_secs());
                Ok(())
            })
            .unwrap();

        let mut log = Vec::new();
        clock.run(secs(50), &mut log).unwrap();
        assert_eq!(log, vec![5, 10, 15, 20, 25, 30, 35, 40, 45, 50]);
        // The timer stays armed past the horizon until destroyed
        assert_eq!(clock.pending(), 1);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let mut clock: EventClock<u32> = EventClock::new();
        let result = clock.schedule_periodic(secs(1), Duration::ZERO, |count, _| {
            *count += 1;
            Ok(())
        });
        assert!(matches!(result, Err(SimError::ZeroInterval)));
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_destroy_drops_pending_without_running() {
        let mut clock: EventClock<u32> = EventClock::new();
        clock.schedule(secs(1), |count, _| {
            *count += 1;
            Ok(())
        });
        clock.schedule(secs(2), |count, _| {
            *count += 1;
            Ok(())
        });

        assert_eq!(clock.destroy(), 2);
        let mut count = 0;
        clock.run(secs(10), &mut count).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_callback_error_halts_run() {
        let mut clock: EventClock<u32> = EventClock::new();
        clock.schedule(secs(1), |_, _| Err(SimError::UnknownEntity(99)));
        clock.schedule(secs(2), |count, _| {
            *count += 1;
            Ok(())
        });

        let mut count = 0;
        let result = clock.run(secs(10), &mut count);
        assert!(matches!(result, Err(SimError::UnknownEntity(99))));
        assert_eq!(count, 0);
        assert_eq!(clock.now(), secs(1));
    }
}
