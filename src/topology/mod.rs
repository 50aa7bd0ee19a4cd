//! Network topology module.
//!
//! This module contains the fixed node set of a run: identities, roles,
//! grid positions, radio adjacency and the private attacker links.

pub mod types;
pub mod layout;
pub mod connections;

// Re-export key types and functions for easier access
pub use types::{Node, NodeId, NodeRole, Position, Topology};
pub use layout::build_topology;
pub use connections::{attacker_links, NeighborTable};
