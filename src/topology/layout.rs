//! Node placement and role assignment.
//!
//! Nodes are laid out row-first on a fixed grid starting at the origin, the
//! same arrangement the reference scenario uses (5 columns, 100 m apart).
//! With 22 nodes that gives four full rows plus the source (20) and sink (21)
//! on the fifth row.

use log::{debug, info};

use crate::config::{RoleConfig, TopologyConfig};
use crate::error::SimResult;
use crate::topology::types::{Node, NodeId, NodeRole, Position, Topology};

/// Position of grid slot `index`
pub fn grid_position(index: u32, grid_width: u32, spacing_m: f64) -> Position {
    let column = index % grid_width;
    let row = index / grid_width;
    Position::new(column as f64 * spacing_m, row as f64 * spacing_m)
}

/// Role of `id` under the given assignment
pub fn role_for(id: NodeId, roles: &RoleConfig) -> NodeRole {
    if id == roles.source {
        NodeRole::TrafficSource
    } else if id == roles.sink {
        NodeRole::TrafficSink
    } else if roles.attackers.contains(&id) {
        NodeRole::Attacker
    } else {
        NodeRole::Regular
    }
}

/// Build the immutable topology of a run
///
/// # Arguments
/// * `topology` - Node count and grid parameters
/// * `roles` - Validated role assignment
pub fn build_topology(topology: &TopologyConfig, roles: &RoleConfig) -> SimResult<Topology> {
    let nodes: Vec<Node> = (0..topology.node_count)
        .map(|id| {
            let node = Node {
                id,
                role: role_for(id, roles),
                position: grid_position(id, topology.grid_width, topology.spacing_m),
            };
            debug!(
                "Node {} placed at ({:.1}, {:.1}) as {}",
                node.id, node.position.x, node.position.y, node.role
            );
            node
        })
        .collect();

    let built = Topology::from_nodes(nodes)?;
    info!(
        "Built topology: {} nodes, attackers {:?}, source {}, sink {}",
        built.len(),
        built.attackers(),
        built.source(),
        built.sink()
    );
    Ok(built)
}
