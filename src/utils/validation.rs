//! Configuration validation utilities.
//!
//! This module provides validation functions for run parameters and
//! consistency checks between them. Each check names the offending
//! parameter in its error message so the CLI can report it verbatim.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::config::{RoleConfig, TopologyConfig, TrafficConfig, ValidationError};

/// Smallest network that still has room for a source, a sink and a relay pair
pub const MIN_NODE_COUNT: u32 = 4;

/// Validate node count and placement parameters
///
/// # Examples
/// ```
/// use sinkholesim::config::TopologyConfig;
/// use sinkholesim::utils::validation::validate_topology_shape;
///
/// assert!(validate_topology_shape(&TopologyConfig::default()).is_ok());
///
/// let tiny = TopologyConfig { node_count: 3, ..TopologyConfig::default() };
/// assert!(validate_topology_shape(&tiny).is_err());
/// ```
pub fn validate_topology_shape(topology: &TopologyConfig) -> Result<(), ValidationError> {
    if topology.node_count < MIN_NODE_COUNT {
        return Err(ValidationError::InvalidTopology(format!(
            "node_count must be at least {}, got {}",
            MIN_NODE_COUNT, topology.node_count
        )));
    }
    if topology.grid_width == 0 {
        return Err(ValidationError::InvalidTopology(
            "grid_width must be greater than zero".to_string(),
        ));
    }
    if !topology.spacing_m.is_finite() || topology.spacing_m <= 0.0 {
        return Err(ValidationError::InvalidTopology(format!(
            "spacing_m must be a positive number, got {}",
            topology.spacing_m
        )));
    }
    if !topology.radio_range_m.is_finite() || topology.radio_range_m <= 0.0 {
        return Err(ValidationError::InvalidTopology(format!(
            "radio_range_m must be a positive number, got {}",
            topology.radio_range_m
        )));
    }
    Ok(())
}

/// Validate role assignment
///
/// Checks that:
/// - source, sink and every attacker id are below `node_count`
/// - no id is used for two roles and no attacker is listed twice
///
/// An empty attacker list is valid and describes the unattacked baseline.
pub fn validate_roles(roles: &RoleConfig, node_count: u32) -> Result<(), ValidationError> {
    let in_range = |name: &str, id: u32| {
        if id >= node_count {
            Err(ValidationError::InvalidRoles(format!(
                "{} id {} is out of range for {} nodes",
                name, id, node_count
            )))
        } else {
            Ok(())
        }
    };

    in_range("source", roles.source)?;
    in_range("sink", roles.sink)?;
    if roles.source == roles.sink {
        return Err(ValidationError::InvalidRoles(format!(
            "source and sink must differ, both are {}",
            roles.source
        )));
    }

    let mut seen = BTreeSet::new();
    for &attacker in &roles.attackers {
        in_range("attacker", attacker)?;
        if attacker == roles.source || attacker == roles.sink {
            return Err(ValidationError::InvalidRoles(format!(
                "attacker id {} collides with the traffic endpoints",
                attacker
            )));
        }
        if !seen.insert(attacker) {
            return Err(ValidationError::InvalidRoles(format!(
                "attacker id {} listed twice",
                attacker
            )));
        }
    }

    Ok(())
}

/// Validate traffic session timing and transport parameters against the horizon
///
/// Requires `start < stop <= horizon`. An empty window is representable
/// (see `SessionWindow`) but is not accepted from configuration.
pub fn validate_session_timing(traffic: &TrafficConfig, horizon: Duration) -> Result<(), ValidationError> {
    if traffic.start >= traffic.stop {
        return Err(ValidationError::InvalidTraffic(format!(
            "start ({:?}) must be before stop ({:?})",
            traffic.start, traffic.stop
        )));
    }
    if traffic.stop > horizon {
        return Err(ValidationError::InvalidTraffic(format!(
            "stop ({:?}) must not be after the horizon ({:?})",
            traffic.stop, horizon
        )));
    }
    if traffic.sink_start > traffic.sink_stop {
        return Err(ValidationError::InvalidTraffic(format!(
            "sink_start ({:?}) must not be after sink_stop ({:?})",
            traffic.sink_start, traffic.sink_stop
        )));
    }
    if traffic.on_duration.is_zero() {
        return Err(ValidationError::InvalidTraffic(
            "on_duration must be greater than zero".to_string(),
        ));
    }
    if traffic.packet_size == 0 {
        return Err(ValidationError::InvalidTraffic(
            "packet_size must be greater than zero".to_string(),
        ));
    }
    if traffic.data_rate_bps == 0 {
        return Err(ValidationError::InvalidTraffic(
            "data_rate_bps must be greater than zero".to_string(),
        ));
    }
    if traffic.phy_rate_bps == 0 {
        return Err(ValidationError::InvalidTraffic(
            "phy_rate_bps must be greater than zero".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&traffic.link_loss) {
        return Err(ValidationError::InvalidTraffic(format!(
            "link_loss must be within [0, 1], got {}",
            traffic.link_loss
        )));
    }
    Ok(())
}
