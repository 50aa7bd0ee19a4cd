//! End-to-end runs of the sinkhole scenario.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use sinkholesim::config::{SimConfig, SuppressionPolicy};
use sinkholesim::config_loader::load_config;
use sinkholesim::energy::EnergyLedger;
use sinkholesim::orchestrator::{RunOutputs, SimulationOrchestrator};
use sinkholesim::traffic::TrafficSession;
use sinkholesim::visual::highlighter::{NEUTRAL, RECEIVER, SENDER};
use sinkholesim::visual::RecordingVisualizer;
use sinkholesim::SimError;
use tempfile::{NamedTempFile, TempDir};

/// (time, node, joules) rows of a telemetry CSV
fn read_samples(path: &Path) -> Vec<(f64, u32, f64)> {
    let contents = fs::read_to_string(path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(lines.next(), Some("Time (s),Node ID,Remaining Energy (J)"));
    lines
        .map(|line| {
            let fields: Vec<&str> = line.split(',').collect();
            assert_eq!(fields.len(), 3, "malformed row {:?}", line);
            (
                fields[0].parse().unwrap(),
                fields[1].parse().unwrap(),
                fields[2].parse().unwrap(),
            )
        })
        .collect()
}

fn by_node(samples: &[(f64, u32, f64)]) -> BTreeMap<u32, Vec<(f64, f64)>> {
    let mut nodes: BTreeMap<u32, Vec<(f64, f64)>> = BTreeMap::new();
    for &(at, node, joules) in samples {
        nodes.entry(node).or_default().push((at, joules));
    }
    nodes
}

#[test]
fn test_default_scenario() {
    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("energy_log.csv");
    let report = SimulationOrchestrator::new(SimConfig::default())
        .unwrap()
        .run(&RunOutputs::csv(&csv))
        .unwrap();

    assert!(report.total_packets_sent > 0);
    assert!(report.total_packets_received <= report.total_packets_sent);
    assert_eq!(report.attackers, vec![2, 7]);

    let nodes = by_node(&read_samples(&csv));
    assert_eq!(nodes.len(), 22);
    let expected_times: Vec<f64> = (1..=10).map(|i| (i * 5) as f64).collect();
    for (node, samples) in &nodes {
        let times: Vec<f64> = samples.iter().map(|s| s.0).collect();
        assert_eq!(times, expected_times, "sample times of node {}", node);

        let mut previous = 50.0;
        for &(_, joules) in samples {
            assert!(joules <= previous, "energy of node {} increased", node);
            assert!(joules >= 0.0);
            previous = joules;
        }
    }
    assert_eq!(report.telemetry_samples, 220);
}

#[test]
fn test_attack_reduces_delivery() {
    let attacked = SimulationOrchestrator::new(SimConfig::default()).unwrap();
    let comparison = attacked.compare_with_baseline(&RunOutputs::discard()).unwrap();

    assert!(comparison.baseline.attackers.is_empty());
    assert!(comparison.attacked.total_packets_received < comparison.baseline.total_packets_received);
    assert!(comparison.attacked.delivery.sunk_by_attacker > 0);
    assert_eq!(comparison.baseline.delivery.sunk_by_attacker, 0);
    assert!(comparison.delivery_deficit() > 0);
}

#[test]
fn test_identical_seed_gives_identical_output() {
    let dir = TempDir::new().unwrap();
    let mut config = SimConfig::default();
    config.traffic.link_loss = 0.2;
    config.attack.suppression = SuppressionPolicy::Probabilistic { drop_probability: 0.5 };

    let orchestrator = SimulationOrchestrator::new(config).unwrap();
    let first = orchestrator.run(&RunOutputs::csv(dir.path().join("a.csv"))).unwrap();
    let second = orchestrator.run(&RunOutputs::csv(dir.path().join("b.csv"))).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        fs::read(dir.path().join("a.csv")).unwrap(),
        fs::read(dir.path().join("b.csv")).unwrap()
    );
}

#[test]
fn test_attacker_that_never_drops_lets_traffic_through() {
    let mut config = SimConfig::default();
    config.attack.suppression = SuppressionPolicy::Probabilistic { drop_probability: 0.0 };

    let report = SimulationOrchestrator::new(config)
        .unwrap()
        .run(&RunOutputs::discard())
        .unwrap();

    assert_eq!(report.delivery.sunk_by_attacker, 0);
    assert!(report.total_packets_received > 0);
}

#[test]
fn test_energy_exhaustion_is_not_an_error() {
    let mut config = SimConfig::default();
    config.energy.initial_joules = 1.0;

    let report = SimulationOrchestrator::new(config)
        .unwrap()
        .run(&RunOutputs::discard())
        .unwrap();

    assert!(report.final_energy.values().all(|&joules| joules == 0.0));
    assert!(report.total_packets_received <= report.total_packets_sent);
    assert_eq!(report.telemetry_samples, 220);
}

#[test]
fn test_unknown_node_energy() {
    let mut ledger = EnergyLedger::new();
    for id in 0..22 {
        ledger.initialize(id, 50.0).unwrap();
    }
    assert!(matches!(ledger.remaining(99), Err(SimError::UnknownEntity(99))));
}

#[test]
fn test_empty_session_window_produces_no_events() {
    let mut config = SimConfig::default();
    config.traffic.start = Duration::from_secs(10);
    config.traffic.stop = Duration::from_secs(10);

    let session = TrafficSession::new(&config.traffic, 20, 21);
    assert!(session.window().is_empty());
    assert_eq!(session.first_send(), None);
    assert!(session.events().is_empty());

    // The same window is refused as run configuration
    assert!(matches!(
        SimulationOrchestrator::new(config),
        Err(SimError::Configuration(_))
    ));
}

#[test]
fn test_yaml_scenario_end_to_end() {
    let yaml = r#"
general:
  seed: 1
  horizon: "20s"
roles:
  attackers: []
traffic:
  stop: "20s"
  sink_stop: "20s"
telemetry:
  interval: "10s"
"#;
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", yaml).unwrap();

    let config = load_config(file.path()).unwrap();
    let report = SimulationOrchestrator::new(config)
        .unwrap()
        .run(&RunOutputs::discard())
        .unwrap();

    assert_eq!(report.telemetry_samples, 22 * 2);
    assert!(report.total_packets_received > 0);
    assert!(report.attackers.is_empty());
}

#[test]
fn test_hop_highlights_are_not_cut_short() {
    let mut config = SimConfig::default();
    config.highlight.trace_hops = true;
    let duration = config.highlight.duration;

    let recorder = RecordingVisualizer::new();
    let report = SimulationOrchestrator::new(config)
        .unwrap()
        .run_with_visualizer(&RunOutputs::discard(), Box::new(recorder.clone()))
        .unwrap();
    assert!(report.total_packets_sent > 0);

    let mut highlighted = 0;
    for node in 0..22 {
        let mut last_highlight: Option<Duration> = None;
        for command in recorder.commands_for(node) {
            if command.color == SENDER || command.color == RECEIVER {
                highlighted += 1;
                last_highlight = Some(command.at);
            } else if command.color == NEUTRAL {
                if let Some(at) = last_highlight {
                    assert!(
                        command.at >= at + duration,
                        "node {} repainted at {:?}, highlighted at {:?}",
                        node,
                        command.at,
                        at
                    );
                }
            }
        }
    }
    // Sender and receiver are painted on every hop
    assert!(highlighted > report.delivery.hop_transmissions);
}

#[test]
fn test_isolated_nodes_have_no_route() {
    let mut config = SimConfig::default();
    config.topology.radio_range_m = config.topology.spacing_m / 2.0;

    let report = SimulationOrchestrator::new(config)
        .unwrap()
        .run(&RunOutputs::discard())
        .unwrap();

    assert!(report.total_packets_sent > 0);
    assert_eq!(report.delivery.no_route, report.total_packets_sent);
    assert_eq!(report.total_packets_received, 0);
    assert_eq!(report.delivery.hop_transmissions, 0);
}

#[test]
fn test_late_sink_rejects_early_packets() {
    let mut config = SimConfig::default().without_attackers();
    config.traffic.sink_start = Duration::from_secs(30);

    let report = SimulationOrchestrator::new(config)
        .unwrap()
        .run(&RunOutputs::discard())
        .unwrap();

    assert!(report.delivery.rejected_by_sink > 0);
    assert!(report.total_packets_received > 0);
    assert!(report.total_packets_received + report.delivery.rejected_by_sink <= report.total_packets_sent);
}
