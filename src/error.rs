//! Simulation error taxonomy.
//!
//! Every fatal condition raised while building or running a simulation is a
//! [`SimError`]. Packet loss is not represented here: dropped or sunk packets
//! are ordinary domain outcomes and only show up in the delivery counters.

use std::time::Duration;

use crate::config::ValidationError;
use crate::topology::NodeId;

/// Errors that abort a simulation run
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Invalid topology, role or timing parameters. Raised before the clock starts.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ValidationError),

    /// A node id that is not part of the topology was referenced
    #[error("Unknown node id {0}")]
    UnknownEntity(NodeId),

    /// An energy budget was initialized twice for the same node
    #[error("Energy for node {0} is already initialized")]
    AlreadyInitialized(NodeId),

    /// A periodic timer was armed with a zero interval
    #[error("Periodic timer interval must be greater than zero")]
    ZeroInterval,

    /// The telemetry sink could not be written or closed
    #[error("Telemetry sink I/O error: {0}")]
    SinkIo(#[source] std::io::Error),

    /// The animation trace could not be written
    #[error("Animation trace I/O error: {0}")]
    TraceIo(#[source] std::io::Error),

    /// A telemetry sample would not be strictly later than the previous one for the node
    #[error("Telemetry sample for node {node} at {at:?} is not after the previous sample at {previous:?}")]
    TelemetryOrder {
        node: NodeId,
        at: Duration,
        previous: Duration,
    },
}

/// Result alias used throughout the simulation core
pub type SimResult<T> = Result<T, SimError>;
