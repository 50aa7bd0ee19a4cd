//! OnOff application flow between the source and the sink.
//!
//! The session decides *when* packets are sent and keeps the only copy of
//! the delivery counters. Moving packets across the network is the
//! transport's job (`traffic::transport`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::TrafficConfig;
use crate::topology::NodeId;

pub type PacketId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Sent,
    Received,
}

/// One observable packet event at an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficEvent {
    pub at: Duration,
    pub direction: Direction,
    pub packet: PacketId,
    pub node: NodeId,
}

/// Half-open activity window `[start, stop)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub start: Duration,
    pub stop: Duration,
}

impl SessionWindow {
    pub fn new(start: Duration, stop: Duration) -> Self {
        Self { start, stop }
    }

    /// A window with `stop <= start` never produces traffic
    pub fn is_empty(&self) -> bool {
        self.stop <= self.start
    }

    pub fn contains(&self, at: Duration) -> bool {
        self.start <= at && at < self.stop
    }
}

/// A single OnOff flow with its counters
#[derive(Debug, Clone)]
pub struct TrafficSession {
    source: NodeId,
    sink: NodeId,
    packet_size: u32,
    send_interval: Duration,
    on_duration: Duration,
    off_duration: Duration,
    window: SessionWindow,
    sink_window: SessionWindow,
    next_packet: PacketId,
    total_packets_sent: u64,
    total_packets_received: u64,
    events: Vec<TrafficEvent>,
}

impl TrafficSession {
    pub fn new(config: &TrafficConfig, source: NodeId, sink: NodeId) -> Self {
        let bits = u128::from(config.packet_size) * 8;
        let interval_nanos = bits * 1_000_000_000 / u128::from(config.data_rate_bps.max(1));

        Self {
            source,
            sink,
            packet_size: config.packet_size,
            send_interval: nanos_to_duration(interval_nanos.max(1)),
            on_duration: config.on_duration,
            off_duration: config.off_duration,
            window: SessionWindow::new(config.start, config.stop),
            sink_window: SessionWindow::new(config.sink_start, config.sink_stop),
            next_packet: 0,
            total_packets_sent: 0,
            total_packets_received: 0,
            events: Vec::new(),
        }
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn sink(&self) -> NodeId {
        self.sink
    }

    pub fn packet_size(&self) -> u32 {
        self.packet_size
    }

    pub fn window(&self) -> SessionWindow {
        self.window
    }

    /// Gap between consecutive packets during an on-period
    pub fn send_interval(&self) -> Duration {
        self.send_interval
    }

    pub fn total_packets_sent(&self) -> u64 {
        self.total_packets_sent
    }

    pub fn total_packets_received(&self) -> u64 {
        self.total_packets_received
    }

    /// Every recorded event in the order it happened
    pub fn events(&self) -> &[TrafficEvent] {
        &self.events
    }

    /// Time of the first transmission attempt, `None` for an empty window
    pub fn first_send(&self) -> Option<Duration> {
        if self.window.is_empty() {
            None
        } else {
            Some(self.window.start)
        }
    }

    /// Time of the attempt following one made at `at`.
    ///
    /// Off-periods are skipped by jumping to the start of the next cycle.
    /// Returns `None` once the next attempt would fall at or after `stop`.
    pub fn next_send_after(&self, at: Duration) -> Option<Duration> {
        let mut candidate = at + self.send_interval;

        if !self.off_duration.is_zero() && candidate > self.window.start {
            let cycle = (self.on_duration + self.off_duration).as_nanos();
            let offset = (candidate - self.window.start).as_nanos();
            if offset % cycle >= self.on_duration.as_nanos() {
                let next_cycle = (offset / cycle + 1) * cycle;
                candidate = self.window.start + nanos_to_duration(next_cycle);
            }
        }

        self.window.contains(candidate).then_some(candidate)
    }

    /// Record a dispatched attempt and hand out its packet id
    pub fn record_sent(&mut self, at: Duration) -> PacketId {
        let packet = self.next_packet;
        self.next_packet += 1;
        self.total_packets_sent += 1;
        self.events.push(TrafficEvent {
            at,
            direction: Direction::Sent,
            packet,
            node: self.source,
        });
        packet
    }

    /// Record a delivery observed at the sink.
    ///
    /// Returns `false` when the sink application was not listening at `at`;
    /// such a packet is not counted.
    pub fn record_received(&mut self, at: Duration, packet: PacketId) -> bool {
        if !self.sink_window.contains(at) {
            return false;
        }
        self.total_packets_received += 1;
        self.events.push(TrafficEvent {
            at,
            direction: Direction::Received,
            packet,
            node: self.sink,
        });
        true
    }
}

fn nanos_to_duration(nanos: u128) -> Duration {
    Duration::new((nanos / 1_000_000_000) as u64, (nanos % 1_000_000_000) as u32)
}
