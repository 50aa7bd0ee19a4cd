//! Topology type definitions.
//!
//! Nodes, their roles and fixed positions. A [`Topology`] is created once at
//! setup and never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ValidationError;
use crate::error::{SimError, SimResult};

/// Stable node identity
pub type NodeId = u32;

/// Role a node plays in the scenario. Every node has exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeRole {
    /// Honest node running the normal routing protocol
    Regular,
    /// Sinkhole node advertising fraudulent routes and swallowing data
    Attacker,
    /// Origin of the OnOff application flow
    TrafficSource,
    /// Destination of the OnOff application flow
    TrafficSink,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Regular => write!(f, "regular"),
            NodeRole::Attacker => write!(f, "attacker"),
            NodeRole::TrafficSource => write!(f, "source"),
            NodeRole::TrafficSink => write!(f, "sink"),
        }
    }
}

/// Fixed 2-D coordinate in metres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in metres
    pub fn distance_to(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A node of the simulated network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub role: NodeRole,
    pub position: Position,
}

/// The immutable node set of a run
#[derive(Debug, Clone)]
pub struct Topology {
    nodes: BTreeMap<NodeId, Node>,
    attackers: Vec<NodeId>,
    source: NodeId,
    sink: NodeId,
}

impl Topology {
    /// Assemble a topology from positioned nodes.
    ///
    /// Roles must be disjoint and total: exactly one source, exactly one sink,
    /// and every node carries a single role.
    pub fn from_nodes(nodes: Vec<Node>) -> SimResult<Self> {
        let mut by_id = BTreeMap::new();
        let mut attackers = Vec::new();
        let mut sources = Vec::new();
        let mut sinks = Vec::new();

        for node in nodes {
            match node.role {
                NodeRole::Attacker => attackers.push(node.id),
                NodeRole::TrafficSource => sources.push(node.id),
                NodeRole::TrafficSink => sinks.push(node.id),
                NodeRole::Regular => {}
            }
            if let Some(previous) = by_id.insert(node.id, node) {
                return Err(ValidationError::InvalidRoles(format!(
                    "node {} defined twice",
                    previous.id
                ))
                .into());
            }
        }

        let (source, sink) = match (sources.as_slice(), sinks.as_slice()) {
            ([source], [sink]) => (*source, *sink),
            _ => {
                return Err(ValidationError::InvalidRoles(format!(
                    "expected exactly one source and one sink, found {} and {}",
                    sources.len(),
                    sinks.len()
                ))
                .into())
            }
        };
        attackers.sort_unstable();

        Ok(Self {
            nodes: by_id,
            attackers,
            source,
            sink,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Look up a node, failing for ids outside the topology
    pub fn node(&self, id: NodeId) -> SimResult<&Node> {
        self.nodes.get(&id).ok_or(SimError::UnknownEntity(id))
    }

    pub fn role(&self, id: NodeId) -> SimResult<NodeRole> {
        self.node(id).map(|node| node.role)
    }

    /// Nodes in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Attacker ids in ascending order
    pub fn attackers(&self) -> &[NodeId] {
        &self.attackers
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn sink(&self) -> NodeId {
        self.sink
    }
}
