//! Periodic energy sampling.

use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::energy::{EnergyLedger, EnergyNotice, Subscription};
use crate::error::{SimError, SimResult};
use crate::telemetry::sink::TelemetrySink;
use crate::topology::NodeId;

/// Remaining energy of one node at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergySample {
    pub at: Duration,
    pub node: NodeId,
    pub remaining_joules: f64,
}

/// Samples every node once per tick and writes the samples to a sink
pub struct TelemetryRecorder {
    interval: Duration,
    sink: Box<dyn TelemetrySink>,
    samples: Vec<EnergySample>,
    last_sampled: BTreeMap<NodeId, Duration>,
    subscription: Subscription,
    ticks: u64,
}

impl TelemetryRecorder {
    pub fn new(interval: Duration, sink: Box<dyn TelemetrySink>, ledger: &EnergyLedger) -> Self {
        Self {
            interval,
            sink,
            samples: Vec::new(),
            last_sampled: BTreeMap::new(),
            subscription: ledger.subscribe(),
            ticks: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// All samples in production order
    pub fn samples(&self) -> &[EnergySample] {
        &self.samples
    }

    pub fn samples_for(&self, node: NodeId) -> impl Iterator<Item = &EnergySample> + '_ {
        self.samples.iter().filter(move |sample| sample.node == node)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Sample every node of `ledger` at `now`, in ascending id order.
    pub fn tick(&mut self, now: Duration, ledger: &EnergyLedger) -> SimResult<()> {
        for notice in ledger.poll(&mut self.subscription) {
            match notice {
                EnergyNotice::Depleted { node, at } => {
                    warn!("Telemetry: node {} ran out of energy at {:.3}s", node, at.as_secs_f64());
                }
            }
        }

        for node in ledger.node_ids() {
            if let Some(&previous) = self.last_sampled.get(&node) {
                if now <= previous {
                    return Err(SimError::TelemetryOrder { node, at: now, previous });
                }
            }

            let sample = EnergySample {
                at: now,
                node,
                remaining_joules: ledger.remaining(node)?,
            };
            self.sink.append(&sample).map_err(SimError::SinkIo)?;
            self.samples.push(sample);
            self.last_sampled.insert(node, now);
        }

        self.ticks += 1;
        debug!("Telemetry tick {} at {:.3}s", self.ticks, now.as_secs_f64());
        Ok(())
    }

    /// Flush and release the sink
    pub fn close(&mut self) -> SimResult<()> {
        self.sink.close().map_err(SimError::SinkIo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::sink::NullTelemetrySink;
    use std::io;

    struct FailingSink;

    impl TelemetrySink for FailingSink {
        fn append(&mut self, _sample: &EnergySample) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn close(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn ledger(nodes: u32) -> EnergyLedger {
        let mut ledger = EnergyLedger::new();
        for id in 0..nodes {
            ledger.initialize(id, 50.0).unwrap();
        }
        ledger
    }

    #[test]
    fn test_one_sample_per_node_per_tick() {
        let ledger = ledger(3);
        let mut recorder = TelemetryRecorder::new(Duration::from_secs(5), Box::new(NullTelemetrySink), &ledger);

        recorder.tick(Duration::from_secs(5), &ledger).unwrap();
        recorder.tick(Duration::from_secs(10), &ledger).unwrap();

        assert_eq!(recorder.interval(), Duration::from_secs(5));
        assert_eq!(recorder.samples().len(), 6);
        assert_eq!(recorder.ticks(), 2);
        let nodes: Vec<NodeId> = recorder.samples().iter().map(|s| s.node).collect();
        assert_eq!(nodes, vec![0, 1, 2, 0, 1, 2]);
        assert_eq!(recorder.samples_for(1).count(), 2);
    }

    #[test]
    fn test_repeated_timestamp_is_rejected() {
        let ledger = ledger(1);
        let mut recorder = TelemetryRecorder::new(Duration::from_secs(5), Box::new(NullTelemetrySink), &ledger);

        recorder.tick(Duration::from_secs(5), &ledger).unwrap();
        let result = recorder.tick(Duration::from_secs(5), &ledger);
        assert!(matches!(result, Err(SimError::TelemetryOrder { node: 0, .. })));
    }

    #[test]
    fn test_sink_failure_is_fatal() {
        let ledger = ledger(2);
        let mut recorder = TelemetryRecorder::new(Duration::from_secs(5), Box::new(FailingSink), &ledger);
        assert!(matches!(
            recorder.tick(Duration::from_secs(5), &ledger),
            Err(SimError::SinkIo(_))
        ));
    }
}
