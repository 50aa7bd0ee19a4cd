//! Mutable state of one simulation run.
//!
//! Every scheduled callback receives `&mut World` from the event clock, so
//! all cross-component interaction goes through these fields.

use std::time::Duration;

use crate::clock::EventClock;
use crate::energy::EnergyLedger;
use crate::error::SimResult;
use crate::routing::RoutingCollaborator;
use crate::telemetry::TelemetryRecorder;
use crate::topology::{NodeId, Topology};
use crate::traffic::{TrafficSession, Transport};
use crate::visual::highlighter::{self, AttackHighlighter};
use crate::visual::Visualizer;

pub struct World {
    pub topology: Topology,
    pub ledger: EnergyLedger,
    pub routing: Box<dyn RoutingCollaborator>,
    pub session: TrafficSession,
    pub transport: Transport,
    /// Installed once the telemetry sink is open
    pub telemetry: Option<TelemetryRecorder>,
    pub highlighter: AttackHighlighter,
    pub visualizer: Box<dyn Visualizer>,
}

impl World {
    /// Paint every node with its role colour at `at`
    pub fn apply_role_colors(&mut self, at: Duration) {
        for node in self.topology.nodes() {
            self.visualizer
                .set_node_color(at, node.id, highlighter::role_color(node.role));
        }
    }

    /// Highlight a transmission and schedule both nodes back to neutral
    pub fn highlight_transmission(
        &mut self,
        clock: &mut EventClock<World>,
        from: NodeId,
        to: NodeId,
    ) -> SimResult<()> {
        let now = clock.now();
        let highlights = self.highlighter.trigger(now, from, to)?;

        for (event, reversion) in highlights {
            self.visualizer.set_node_color(event.at, event.node, event.color);
            clock.schedule(event.duration, move |world: &mut World, clock: &mut EventClock<World>| {
                if let Some(node) = world.highlighter.revert(reversion) {
                    world
                        .visualizer
                        .set_node_color(clock.now(), node, highlighter::NEUTRAL);
                }
                Ok(())
            });
        }
        Ok(())
    }
}
