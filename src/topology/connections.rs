//! Radio adjacency and attacker links.
//!
//! This file derives who can hear whom from the fixed node positions and
//! builds the private link list shared by attacker nodes. The private links
//! are never part of the radio graph; they are handed to the routing
//! collaborator as a configuration override.

use std::collections::BTreeMap;

use crate::topology::types::{NodeId, Topology};

/// Radio neighbours of every node, each list sorted by ascending id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborTable {
    neighbors: BTreeMap<NodeId, Vec<NodeId>>,
}

impl NeighborTable {
    /// Connect every pair of distinct nodes at most `range_m` metres apart
    pub fn within_range(topology: &Topology, range_m: f64) -> Self {
        let mut neighbors: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
        for node in topology.nodes() {
            let in_range = topology
                .nodes()
                .filter(|other| other.id != node.id)
                .filter(|other| node.position.distance_to(&other.position) <= range_m)
                .map(|other| other.id)
                .collect();
            neighbors.insert(node.id, in_range);
        }
        Self { neighbors }
    }

    /// Neighbours of `node`, empty for unknown ids
    pub fn of(&self, node: NodeId) -> &[NodeId] {
        self.neighbors.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn are_neighbors(&self, a: NodeId, b: NodeId) -> bool {
        self.of(a).contains(&b)
    }
}

/// Generate the private attacker link list
///
/// Every pair of attackers shares one undirected link, listed once with the
/// lower id first.
///
/// # Arguments
/// * `attackers` - Attacker ids, in any order
///
/// # Returns
/// A vector of `(lower, higher)` pairs in ascending order
pub fn attacker_links(attackers: &[NodeId]) -> Vec<(NodeId, NodeId)> {
    let mut sorted = attackers.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut links = Vec::new();
    for (i, &a) in sorted.iter().enumerate() {
        for &b in &sorted[i + 1..] {
            links.push((a, b));
        }
    }
    links
}
