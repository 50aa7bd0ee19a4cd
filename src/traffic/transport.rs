//! Hop-by-hop packet transport.
//!
//! Stand-in for the external transport/radio layer. A dispatched packet
//! follows the route the routing collaborator hands out; every hop is a
//! scheduled transmission followed by a scheduled delivery one airtime
//! later. Each hop charges the radio energy model, may be lost in
//! propagation, and, on arrival, is put through the forwarding policy
//! before the node passes it on. Nothing here is an error when a packet
//! disappears; losses only show up in [`DeliveryStats`].

use std::time::Duration;

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::clock::EventClock;
use crate::config::SimConfig;
use crate::energy::{EnergyNotice, RadioEnergyModel, Subscription};
use crate::error::SimResult;
use crate::routing::{ForwardDecision, ForwardingPolicy};
use crate::topology::NodeId;
use crate::traffic::session::PacketId;
use crate::world::World;

/// Where packets that never reached the sink went
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStats {
    /// Swallowed by an attacker applying its suppression policy
    pub sunk_by_attacker: u64,
    /// Lost in propagation or at a node without energy
    pub lost_in_transit: u64,
    /// Dispatched while the sink was unreachable
    pub no_route: u64,
    /// Arrived while the sink application was not listening
    pub rejected_by_sink: u64,
    /// Link-level transmissions performed
    pub hop_transmissions: u64,
}

/// Transport state of one run
#[derive(Debug)]
pub struct Transport {
    radio: RadioEnergyModel,
    policy: ForwardingPolicy,
    link_loss: f64,
    idle_tick: Duration,
    trace_hops: bool,
    rng: StdRng,
    stats: DeliveryStats,
    energy_subscription: Subscription,
}

/// A packet on its way along a route
#[derive(Debug, Clone)]
struct InFlight {
    packet: PacketId,
    hops: Vec<NodeId>,
    /// Index into `hops` of the node currently holding the packet
    at: usize,
}

impl Transport {
    pub fn new(config: &SimConfig, energy_subscription: Subscription) -> Self {
        Self {
            radio: RadioEnergyModel::new(&config.energy, config.traffic.phy_rate_bps),
            policy: ForwardingPolicy::new(config.attack.suppression),
            link_loss: config.traffic.link_loss,
            idle_tick: config.energy.idle_tick,
            trace_hops: config.highlight.trace_hops,
            rng: StdRng::seed_from_u64(config.general.seed),
            stats: DeliveryStats::default(),
            energy_subscription,
        }
    }

    pub fn stats(&self) -> &DeliveryStats {
        &self.stats
    }

    pub fn radio(&self) -> &RadioEnergyModel {
        &self.radio
    }

    pub fn policy(&self) -> ForwardingPolicy {
        self.policy
    }
}

/// Arm the periodic idle-listening drain of the radio model
pub fn install_idle_drain(clock: &mut EventClock<World>, idle_tick: Duration) -> SimResult<()> {
    clock.schedule_periodic(idle_tick, idle_tick, |world, clock| {
        let tick = world.transport.idle_tick;
        world.transport.radio.settle_idle(&mut world.ledger, tick, clock.now())
    })?;
    Ok(())
}

/// Arm the OnOff send chain of the session. An empty window schedules nothing.
pub fn install_session(clock: &mut EventClock<World>, first_send: Option<Duration>) {
    let Some(first) = first_send else {
        debug!("Traffic session window is empty, no packets will be sent");
        return;
    };
    let delay = first.saturating_sub(clock.now());
    clock.schedule(delay, send_tick);
}

fn send_tick(world: &mut World, clock: &mut EventClock<World>) -> SimResult<()> {
    let now = clock.now();
    let packet = world.session.record_sent(now);
    dispatch(world, clock, packet)?;

    if let Some(next) = world.session.next_send_after(now) {
        clock.schedule(next - now, send_tick);
    }
    Ok(())
}

/// Hand a packet to the network at the session's source
pub fn dispatch(world: &mut World, clock: &mut EventClock<World>, packet: PacketId) -> SimResult<()> {
    refresh_routing(world);

    let (source, sink) = (world.session.source(), world.session.sink());
    let Some(route) = world.routing.route(source, sink) else {
        world.transport.stats.no_route += 1;
        debug!("Packet {} dropped: no route {} -> {}", packet, source, sink);
        return Ok(());
    };

    trace!(
        "Packet {} dispatched over {} hops {:?}",
        packet,
        route.hop_count(),
        route.hops
    );
    transmit(
        world,
        clock,
        InFlight {
            packet,
            hops: route.hops,
            at: 0,
        },
    )
}

/// Drop depleted nodes from routing before resolving a new path
fn refresh_routing(world: &mut World) {
    let depleted: Vec<NodeId> = world
        .ledger
        .poll(&mut world.transport.energy_subscription)
        .iter()
        .map(|notice| match notice {
            EnergyNotice::Depleted { node, .. } => *node,
        })
        .collect();
    for node in depleted {
        world.routing.invalidate(node);
    }
}

fn transmit(world: &mut World, clock: &mut EventClock<World>, flight: InFlight) -> SimResult<()> {
    let now = clock.now();
    let from = flight.hops[flight.at];
    let Some(&to) = flight.hops.get(flight.at + 1) else {
        world.transport.stats.lost_in_transit += 1;
        debug!("Packet {} stranded at node {}: no next hop", flight.packet, from);
        return Ok(());
    };

    if world.ledger.is_depleted(from)? {
        world.transport.stats.lost_in_transit += 1;
        debug!("Packet {} lost: sender {} has no energy", flight.packet, from);
        return Ok(());
    }

    let airtime = world.transport.radio.airtime(world.session.packet_size());
    world
        .transport
        .radio
        .charge_tx(&mut world.ledger, from, airtime, now)?;
    world.transport.stats.hop_transmissions += 1;

    if world.transport.trace_hops {
        world.highlight_transmission(clock, from, to)?;
    }

    // Only draw when loss is configured so lossless runs keep the random stream untouched
    if world.transport.link_loss > 0.0 && world.transport.rng.gen_bool(world.transport.link_loss) {
        world.transport.stats.lost_in_transit += 1;
        debug!("Packet {} lost on link {} -> {}", flight.packet, from, to);
        return Ok(());
    }

    let arriving = InFlight {
        at: flight.at + 1,
        ..flight
    };
    clock.schedule(airtime, move |world, clock| deliver(world, clock, arriving));
    Ok(())
}

/// Packet arrival at the next node of its route
fn deliver(world: &mut World, clock: &mut EventClock<World>, flight: InFlight) -> SimResult<()> {
    let now = clock.now();
    let node = flight.hops[flight.at];

    if world.ledger.is_depleted(node)? {
        world.transport.stats.lost_in_transit += 1;
        debug!("Packet {} lost: receiver {} has no energy", flight.packet, node);
        return Ok(());
    }
    let airtime = world.transport.radio.airtime(world.session.packet_size());
    world
        .transport
        .radio
        .charge_rx(&mut world.ledger, node, airtime, now)?;

    if node == world.session.sink() {
        if world.session.record_received(now, flight.packet) {
            trace!("Packet {} received at sink {}", flight.packet, node);
        } else {
            world.transport.stats.rejected_by_sink += 1;
        }
        return Ok(());
    }

    let role = world.topology.role(node)?;
    match world.transport.policy.decide(role, &mut world.transport.rng) {
        ForwardDecision::Sink => {
            world.transport.stats.sunk_by_attacker += 1;
            debug!("Packet {} sunk by attacker {}", flight.packet, node);
            Ok(())
        }
        ForwardDecision::Forward => transmit(world, clock, flight),
    }
}
