//! Radio energy consumption model.
//!
//! Stand-in for the external radio layer: it converts transmissions,
//! receptions and idle listening into consumption signals on the
//! [`EnergyLedger`]. Energy is `current * voltage * duration`, with the
//! currents of the reference scenario (tx 1.5 A, rx 1.3 A, idle 0.03 A) on
//! a 3 V supply.

use std::time::Duration;

use crate::config::EnergyConfig;
use crate::energy::ledger::EnergyLedger;
use crate::error::SimResult;
use crate::topology::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub struct RadioEnergyModel {
    supply_voltage: f64,
    tx_current_a: f64,
    rx_current_a: f64,
    idle_current_a: f64,
    phy_rate_bps: u64,
}

impl RadioEnergyModel {
    pub fn new(energy: &EnergyConfig, phy_rate_bps: u64) -> Self {
        Self {
            supply_voltage: energy.supply_voltage,
            tx_current_a: energy.tx_current_a,
            rx_current_a: energy.rx_current_a,
            idle_current_a: energy.idle_current_a,
            phy_rate_bps,
        }
    }

    /// Time on air for a frame of `bytes`
    pub fn airtime(&self, bytes: u32) -> Duration {
        let bits = u128::from(bytes) * 8;
        let nanos = bits * 1_000_000_000 / u128::from(self.phy_rate_bps.max(1));
        Duration::from_nanos(nanos as u64)
    }

    pub fn tx_energy(&self, airtime: Duration) -> f64 {
        self.tx_current_a * self.supply_voltage * airtime.as_secs_f64()
    }

    pub fn rx_energy(&self, airtime: Duration) -> f64 {
        self.rx_current_a * self.supply_voltage * airtime.as_secs_f64()
    }

    pub fn idle_energy(&self, period: Duration) -> f64 {
        self.idle_current_a * self.supply_voltage * period.as_secs_f64()
    }

    /// Charge the sender of a frame
    pub fn charge_tx(&self, ledger: &mut EnergyLedger, node: NodeId, airtime: Duration, at: Duration) -> SimResult<f64> {
        ledger.consume(node, self.tx_energy(airtime), at)
    }

    /// Charge the receiver of a frame
    pub fn charge_rx(&self, ledger: &mut EnergyLedger, node: NodeId, airtime: Duration, at: Duration) -> SimResult<f64> {
        ledger.consume(node, self.rx_energy(airtime), at)
    }

    /// Charge every node for `period` of idle listening
    pub fn settle_idle(&self, ledger: &mut EnergyLedger, period: Duration, at: Duration) -> SimResult<()> {
        let joules = self.idle_energy(period);
        let nodes: Vec<NodeId> = ledger.node_ids().collect();
        for node in nodes {
            ledger.consume(node, joules, at)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> RadioEnergyModel {
        RadioEnergyModel::new(&EnergyConfig::default(), 8_000_000)
    }

    #[test]
    fn test_airtime() {
        // 1000 bytes at 8 Mbit/s
        assert_eq!(model().airtime(1000), Duration::from_millis(1));
    }

    #[test]
    fn test_energy_per_state() {
        let model = model();
        let one_ms = Duration::from_millis(1);
        assert!((model.tx_energy(one_ms) - 0.0045).abs() < 1e-12);
        assert!((model.rx_energy(one_ms) - 0.0039).abs() < 1e-12);
        assert!((model.idle_energy(Duration::from_secs(1)) - 0.09).abs() < 1e-12);
    }

    #[test]
    fn test_settle_idle_charges_every_node() {
        let mut ledger = EnergyLedger::new();
        ledger.initialize(0, 1.0).unwrap();
        ledger.initialize(1, 1.0).unwrap();

        model()
            .settle_idle(&mut ledger, Duration::from_secs(1), Duration::from_secs(1))
            .unwrap();
        assert!((ledger.remaining(0).unwrap() - 0.91).abs() < 1e-12);
        assert!((ledger.remaining(1).unwrap() - 0.91).abs() < 1e-12);
    }
}
