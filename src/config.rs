use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::topology::NodeId;
use crate::utils::validation::{validate_roles, validate_session_timing, validate_topology_shape};

/// Top-level configuration structure that mirrors the YAML configuration.
///
/// Every section is optional in the file; missing sections fall back to the
/// reference scenario (22 nodes, sinkholes 2 and 7, flow 20 -> 21, 50 s run).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub general: GeneralConfig,
    pub topology: TopologyConfig,
    pub roles: RoleConfig,
    pub energy: EnergyConfig,
    pub telemetry: TelemetryConfig,
    pub traffic: TrafficConfig,
    pub attack: AttackConfig,
    pub highlight: HighlightConfig,
}

impl SimConfig {
    /// Validate the configuration.
    ///
    /// Runs before anything is built; a failure here means the clock never starts.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.general.horizon.is_zero() {
            return Err(ValidationError::InvalidGeneral(
                "horizon must be greater than zero".to_string(),
            ));
        }

        validate_topology_shape(&self.topology)?;
        validate_roles(&self.roles, self.topology.node_count)?;
        validate_session_timing(&self.traffic, self.general.horizon)?;

        if !self.energy.initial_joules.is_finite() || self.energy.initial_joules < 0.0 {
            return Err(ValidationError::InvalidEnergy(format!(
                "initial_joules must be a finite non-negative number, got {}",
                self.energy.initial_joules
            )));
        }
        for (name, value) in [
            ("supply_voltage", self.energy.supply_voltage),
            ("tx_current_a", self.energy.tx_current_a),
            ("rx_current_a", self.energy.rx_current_a),
            ("idle_current_a", self.energy.idle_current_a),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidEnergy(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }
        if self.energy.idle_tick.is_zero() {
            return Err(ValidationError::InvalidEnergy(
                "idle_tick must be greater than zero".to_string(),
            ));
        }

        if self.telemetry.interval.is_zero() {
            return Err(ValidationError::InvalidTelemetry(
                "interval must be greater than zero".to_string(),
            ));
        }

        if let SuppressionPolicy::Probabilistic { drop_probability } = self.attack.suppression {
            if !(0.0..=1.0).contains(&drop_probability) {
                return Err(ValidationError::InvalidAttack(format!(
                    "drop_probability must be within [0, 1], got {}",
                    drop_probability
                )));
            }
        }

        if self.highlight.duration.is_zero() {
            return Err(ValidationError::InvalidHighlight(
                "duration must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Copy of this configuration with every attacker removed.
    ///
    /// Used as the reference run when measuring the damage done by the attack.
    pub fn without_attackers(&self) -> SimConfig {
        let mut baseline = self.clone();
        baseline.roles.attackers.clear();
        baseline
    }
}

/// General run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Seed for every stochastic input (propagation loss, probabilistic interception)
    pub seed: u64,
    /// Run horizon T_end
    #[serde(with = "humantime_serde")]
    pub horizon: Duration,
}

/// Node count and placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    pub node_count: u32,
    /// Nodes per row of the placement grid
    pub grid_width: u32,
    /// Distance between neighbouring grid points in metres
    pub spacing_m: f64,
    /// Maximum distance at which two nodes hear each other
    pub radio_range_m: f64,
}

/// Role assignment by node id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleConfig {
    pub attackers: Vec<NodeId>,
    pub source: NodeId,
    pub sink: NodeId,
}

/// Energy source and radio consumption parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    pub initial_joules: f64,
    pub supply_voltage: f64,
    pub tx_current_a: f64,
    pub rx_current_a: f64,
    pub idle_current_a: f64,
    /// How often idle consumption is settled
    #[serde(with = "humantime_serde")]
    pub idle_tick: Duration,
}

/// Energy telemetry sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

/// OnOff application flow and transport parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    /// Application payload in bytes
    pub packet_size: u32,
    /// Sending rate during on-periods in bits per second
    pub data_rate_bps: u64,
    #[serde(with = "humantime_serde")]
    pub on_duration: Duration,
    #[serde(with = "humantime_serde")]
    pub off_duration: Duration,
    #[serde(with = "humantime_serde")]
    pub start: Duration,
    #[serde(with = "humantime_serde")]
    pub stop: Duration,
    /// Window in which the sink application accepts packets
    #[serde(with = "humantime_serde")]
    pub sink_start: Duration,
    #[serde(with = "humantime_serde")]
    pub sink_stop: Duration,
    /// Physical layer bit rate, determines per-hop airtime
    pub phy_rate_bps: u64,
    /// Probability that a single hop transmission is lost in propagation
    pub link_loss: f64,
}

/// What attacker nodes do with application data they attracted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionPolicy {
    /// Swallow every data packet
    DropAll,
    /// Swallow each data packet with the given probability, forward the rest
    Probabilistic { drop_probability: f64 },
}

/// Attack behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackConfig {
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub suppression: SuppressionPolicy,
}

/// Visual highlighting of transmissions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// When the initial source -> sink highlight fires
    #[serde(with = "humantime_serde")]
    pub at: Duration,
    /// How long a node keeps its highlight colour
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    /// Also highlight every hop of every data packet
    pub trace_hops: bool,
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid topology configuration: {0}")]
    InvalidTopology(String),
    #[error("Invalid role configuration: {0}")]
    InvalidRoles(String),
    #[error("Invalid energy configuration: {0}")]
    InvalidEnergy(String),
    #[error("Invalid telemetry configuration: {0}")]
    InvalidTelemetry(String),
    #[error("Invalid traffic configuration: {0}")]
    InvalidTraffic(String),
    #[error("Invalid attack configuration: {0}")]
    InvalidAttack(String),
    #[error("Invalid highlight configuration: {0}")]
    InvalidHighlight(String),
}

/// Default implementations
impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            horizon: Duration::from_secs(50),
        }
    }
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            node_count: 22,
            grid_width: 5,
            spacing_m: 100.0,
            radio_range_m: 150.0,
        }
    }
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            attackers: vec![2, 7],
            source: 20,
            sink: 21,
        }
    }
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            initial_joules: 50.0,
            supply_voltage: 3.0,
            tx_current_a: 1.5,
            rx_current_a: 1.3,
            idle_current_a: 0.03,
            idle_tick: Duration::from_secs(1),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
        }
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            packet_size: 1024,
            data_rate_bps: 500_000,
            on_duration: Duration::from_secs(1),
            off_duration: Duration::ZERO,
            start: Duration::from_secs(2),
            stop: Duration::from_secs(50),
            sink_start: Duration::from_secs(1),
            sink_stop: Duration::from_secs(50),
            phy_rate_bps: 6_500_000,
            link_loss: 0.0,
        }
    }
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            suppression: SuppressionPolicy::DropAll,
        }
    }
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            at: Duration::from_secs(2),
            duration: Duration::from_secs(1),
            trace_hops: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_reference_scenario() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.topology.node_count, 22);
        assert_eq!(config.roles.attackers, vec![2, 7]);
        assert_eq!(config.roles.source, 20);
        assert_eq!(config.roles.sink, 21);
        assert_eq!(config.energy.initial_joules, 50.0);
        assert_eq!(config.telemetry.interval, Duration::from_secs(5));
        assert_eq!(config.general.horizon, Duration::from_secs(50));
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
general:
  seed: 7
  horizon: "20s"
roles:
  attackers: [3]
  source: 0
  sink: 1
traffic:
  start: "500ms"
  stop: "10s"
attack:
  suppression:
    probabilistic:
      drop_probability: 0.5
"#;

        let config: SimConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.general.seed, 7);
        assert_eq!(config.general.horizon, Duration::from_secs(20));
        assert_eq!(config.roles.attackers, vec![3]);
        assert_eq!(config.traffic.start, Duration::from_millis(500));
        assert_eq!(config.traffic.packet_size, 1024);
        assert_eq!(
            config.attack.suppression,
            SuppressionPolicy::Probabilistic { drop_probability: 0.5 }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_drop_all_parses_from_plain_string() {
        let yaml = "attack:\n  suppression: drop_all\n";
        let config: SimConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.attack.suppression, SuppressionPolicy::DropAll);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = SimConfig::default();
        config.telemetry.interval = Duration::ZERO;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTelemetry(_))));

        let mut config = SimConfig::default();
        config.energy.initial_joules = -1.0;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidEnergy(_))));

        let mut config = SimConfig::default();
        config.attack.suppression = SuppressionPolicy::Probabilistic { drop_probability: 1.5 };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidAttack(_))));

        let mut config = SimConfig::default();
        config.roles.sink = 22;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidRoles(_))));
    }

    #[test]
    fn test_without_attackers() {
        let baseline = SimConfig::default().without_attackers();
        assert!(baseline.roles.attackers.is_empty());
        assert!(baseline.validate().is_ok());
    }
}
