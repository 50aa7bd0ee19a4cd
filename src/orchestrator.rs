//! Simulation orchestrator.
//!
//! Wires every component of one run together in a fixed order, drives the
//! event clock to the horizon and turns the final state into a
//! [`RunReport`]. Any failing step aborts the remaining ones; the telemetry
//! sink is closed on every path out of a run that got as far as opening it.

use std::collections::BTreeMap;
use std::path::PathBuf;

use log::{debug, info, warn};

use crate::clock::EventClock;
use crate::config::SimConfig;
use crate::energy::EnergyLedger;
use crate::error::{SimError, SimResult};
use crate::report::{BaselineComparison, RunReport};
use crate::routing::{FreshestRouteResolver, RoutingCollaborator};
use crate::telemetry::{CsvTelemetrySink, NullTelemetrySink, TelemetryRecorder, TelemetrySink};
use crate::topology::{attacker_links, build_topology, Node};
use crate::traffic::transport::{install_idle_drain, install_session};
use crate::traffic::{TrafficSession, Transport};
use crate::visual::{AnimationTrace, AttackHighlighter, NullVisualizer, Visualizer};
use crate::world::World;

/// Where telemetry samples go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryTarget {
    Csv(PathBuf),
    Discard,
}

/// Files a run produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutputs {
    pub telemetry: TelemetryTarget,
    pub animation_trace: Option<PathBuf>,
}

impl RunOutputs {
    /// Produce no files at all
    pub fn discard() -> Self {
        Self {
            telemetry: TelemetryTarget::Discard,
            animation_trace: None,
        }
    }

    pub fn csv(path: impl Into<PathBuf>) -> Self {
        Self {
            telemetry: TelemetryTarget::Csv(path.into()),
            animation_trace: None,
        }
    }
}

/// Runs the sinkhole scenario described by a validated configuration
#[derive(Debug, Clone)]
pub struct SimulationOrchestrator {
    config: SimConfig,
}

impl SimulationOrchestrator {
    /// Validate `config`; nothing is built before it passes.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run once, rendering to an animation trace when one is requested
    pub fn run(&self, outputs: &RunOutputs) -> SimResult<RunReport> {
        let visualizer: Box<dyn Visualizer> = match &outputs.animation_trace {
            Some(path) => Box::new(AnimationTrace::new(path)),
            None => Box::new(NullVisualizer),
        };
        self.run_with_visualizer(outputs, visualizer)
    }

    /// Run once with a caller-provided visualisation collaborator
    pub fn run_with_visualizer(&self, outputs: &RunOutputs, visualizer: Box<dyn Visualizer>) -> SimResult<RunReport> {
        let mut clock: EventClock<World> = EventClock::new();
        let mut world = self.assemble(&mut clock, visualizer)?;

        let prepared = self.prepare(&mut world, &mut clock, outputs);
        let started = prepared.is_ok();
        let outcome = prepared.and_then(|()| {
            info!("Step 8: running until {:?}", self.config.general.horizon);
            clock.run(self.config.general.horizon, &mut world)
        });
        let released = release(&mut world, started);

        let result = match (outcome, released) {
            (Err(e), Err(release_err)) => {
                warn!("Releasing outputs after a failed run also failed: {}", release_err);
                Err(e)
            }
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) => self.build_report(&world, &clock),
        };

        let dropped = clock.destroy();
        debug!("Run finished, {} callbacks discarded", dropped);
        result
    }

    /// Run this configuration and its zero-attacker counterpart in parallel.
    ///
    /// Only the attacked run writes `outputs`; the baseline produces no files.
    pub fn compare_with_baseline(&self, outputs: &RunOutputs) -> SimResult<BaselineComparison> {
        let baseline = SimulationOrchestrator::new(self.config.without_attackers())?;
        info!("Running attacked and baseline scenarios in parallel");

        let (attacked, baseline) = rayon::join(|| self.run(outputs), || baseline.run(&RunOutputs::discard()));
        Ok(BaselineComparison {
            attacked: attacked?,
            baseline: baseline?,
        })
    }

    /// Build topology, energy, routing and traffic, and arm their timers
    fn assemble(&self, clock: &mut EventClock<World>, visualizer: Box<dyn Visualizer>) -> SimResult<World> {
        let config = &self.config;

        info!("Step 1: building topology");
        let topology = build_topology(&config.topology, &config.roles)?;

        info!(
            "Step 2: initialising energy budgets of {:.1} J",
            config.energy.initial_joules
        );
        let mut ledger = EnergyLedger::new();
        for id in topology.ids() {
            ledger.initialize(id, config.energy.initial_joules)?;
        }

        info!("Step 3: configuring routing with {} attackers", topology.attackers().len());
        let links = attacker_links(topology.attackers());
        let mut routing = FreshestRouteResolver::new(config.topology.radio_range_m);
        routing.configure(&topology, &links);

        info!(
            "Step 4: installing traffic session {} -> {}",
            topology.source(),
            topology.sink()
        );
        let session = TrafficSession::new(&config.traffic, topology.source(), topology.sink());
        let first_send = session.first_send();
        let transport = Transport::new(config, ledger.subscribe());
        let highlighter = AttackHighlighter::new(topology.ids(), config.highlight.duration);
        debug!(
            "Packet airtime {:?}, attacker suppression {:?}, highlight duration {:?}",
            transport.radio().airtime(session.packet_size()),
            transport.policy().suppression(),
            highlighter.duration()
        );

        install_session(clock, first_send);
        install_idle_drain(clock, config.energy.idle_tick)?;

        Ok(World {
            topology,
            ledger,
            routing: Box::new(routing),
            session,
            transport,
            telemetry: None,
            highlighter,
            visualizer,
        })
    }

    /// Open telemetry and arm sampling and highlighting
    fn prepare(&self, world: &mut World, clock: &mut EventClock<World>, outputs: &RunOutputs) -> SimResult<()> {
        let config = &self.config;

        info!("Step 5: opening telemetry sink");
        let sink: Box<dyn TelemetrySink> = match &outputs.telemetry {
            TelemetryTarget::Csv(path) => Box::new(CsvTelemetrySink::create(path).map_err(SimError::SinkIo)?),
            TelemetryTarget::Discard => Box::new(NullTelemetrySink),
        };
        let recorder = TelemetryRecorder::new(config.telemetry.interval, sink, &world.ledger);
        let interval = recorder.interval();
        world.telemetry = Some(recorder);

        info!("Step 6: sampling energy every {:?}", interval);
        clock.schedule_periodic(interval, interval, |world: &mut World, clock: &mut EventClock<World>| {
            match world.telemetry.as_mut() {
                Some(recorder) => recorder.tick(clock.now(), &world.ledger),
                None => Ok(()),
            }
        })?;

        info!("Step 7: scheduling highlight at {:?}", config.highlight.at);
        let nodes: Vec<Node> = world.topology.nodes().cloned().collect();
        world.visualizer.describe_nodes(&nodes);
        world.apply_role_colors(clock.now());
        let (source, sink) = (world.topology.source(), world.topology.sink());
        clock.schedule(config.highlight.at, move |world: &mut World, clock: &mut EventClock<World>| {
            world.highlight_transmission(clock, source, sink)
        });
        Ok(())
    }

    fn build_report(&self, world: &World, clock: &EventClock<World>) -> SimResult<RunReport> {
        let mut final_energy = BTreeMap::new();
        let mut consumed = 0.0;
        for id in world.ledger.node_ids() {
            let remaining = world.ledger.remaining(id)?;
            consumed += world.ledger.initial(id)? - remaining;
            final_energy.insert(id, remaining);
        }
        debug!("{:.3} J consumed across {} nodes", consumed, final_energy.len());

        let report = RunReport {
            seed: self.config.general.seed,
            horizon_secs: self.config.general.horizon.as_secs_f64(),
            attackers: world.topology.attackers().to_vec(),
            total_packets_sent: world.session.total_packets_sent(),
            total_packets_received: world.session.total_packets_received(),
            delivery: world.transport.stats().clone(),
            telemetry_samples: world.telemetry.as_ref().map_or(0, |t| t.samples().len()),
            events_processed: clock.processed(),
            final_energy,
        };
        info!(
            "Step 10: run complete, {} sent / {} received",
            report.total_packets_sent, report.total_packets_received
        );
        Ok(report)
    }
}

/// Close the telemetry sink and, for a run that reached the clock, let the
/// visualizer persist what it collected
fn release(world: &mut World, started: bool) -> SimResult<()> {
    info!("Step 9: closing telemetry sink");
    let closed = match world.telemetry.as_mut() {
        Some(recorder) => recorder.close(),
        None => Ok(()),
    };
    if !started {
        debug!("Run aborted during setup, visualizer output skipped");
        return closed;
    }
    let finished = world.visualizer.finish().map_err(SimError::TraceIo);
    closed.and(finished)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::highlighter::{NEUTRAL, RECEIVER, SENDER, SOURCE};
    use std::time::Duration;
    use crate::visual::RecordingVisualizer;
    use tempfile::TempDir;

    fn short_config() -> SimConfig {
        let mut config = SimConfig::default();
        config.general.horizon = Duration::from_secs(10);
        config.traffic.stop = Duration::from_secs(10);
        config.traffic.sink_stop = Duration::from_secs(10);
        config
    }

    #[test]
    fn test_invalid_config_never_runs() {
        let mut config = SimConfig::default();
        config.topology.node_count = 3;
        assert!(matches!(
            SimulationOrchestrator::new(config),
            Err(SimError::Configuration(_))
        ));
    }

    #[test]
    fn test_run_counts_traffic() {
        let orchestrator = SimulationOrchestrator::new(short_config()).unwrap();
        let report = orchestrator.run(&RunOutputs::discard()).unwrap();

        assert!(report.total_packets_sent > 0);
        assert!(report.total_packets_received <= report.total_packets_sent);
        assert_eq!(report.telemetry_samples, 22 * 2);
        assert_eq!(report.final_energy.len(), 22);
    }

    #[test]
    fn test_initial_colors_and_highlight() {
        let orchestrator = SimulationOrchestrator::new(short_config()).unwrap();
        let recorder = RecordingVisualizer::new();
        orchestrator
            .run_with_visualizer(&RunOutputs::discard(), Box::new(recorder.clone()))
            .unwrap();

        let source: Vec<_> = recorder.commands_for(20).into_iter().map(|c| (c.at, c.color)).collect();
        assert_eq!(
            source,
            vec![
                (Duration::ZERO, SOURCE),
                (Duration::from_secs(2), SENDER),
                (Duration::from_secs(3), NEUTRAL),
            ]
        );
        let sink: Vec<_> = recorder.commands_for(21).into_iter().map(|c| c.color).collect();
        assert_eq!(sink, vec![NEUTRAL, RECEIVER, NEUTRAL]);
    }

    #[test]
    fn test_unwritable_sink_fails_before_running() {
        let dir = TempDir::new().unwrap();
        let outputs = RunOutputs::csv(dir.path().join("missing").join("energy.csv"));
        let orchestrator = SimulationOrchestrator::new(short_config()).unwrap();
        assert!(matches!(orchestrator.run(&outputs), Err(SimError::SinkIo(_))));
    }

    #[test]
    fn test_aborted_setup_writes_no_animation_trace() {
        let dir = TempDir::new().unwrap();
        let trace = dir.path().join("trace.json");
        let outputs = RunOutputs {
            telemetry: TelemetryTarget::Csv(dir.path().join("missing").join("energy.csv")),
            animation_trace: Some(trace.clone()),
        };
        let orchestrator = SimulationOrchestrator::new(short_config()).unwrap();

        assert!(matches!(orchestrator.run(&outputs), Err(SimError::SinkIo(_))));
        assert!(!trace.exists());
    }

    #[test]
    fn test_animation_trace_is_written() {
        let dir = TempDir::new().unwrap();
        let trace = dir.path().join("trace.json");
        let outputs = RunOutputs {
            telemetry: TelemetryTarget::Discard,
            animation_trace: Some(trace.clone()),
        };
        SimulationOrchestrator::new(short_config())
            .unwrap()
            .run(&outputs)
            .unwrap();

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(trace).unwrap()).unwrap();
        assert_eq!(json["nodes"].as_array().unwrap().len(), 22);
    }
}
