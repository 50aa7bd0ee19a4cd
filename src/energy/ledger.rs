//! Per-node energy bookkeeping.
//!
//! The ledger is read by many components but written only through
//! [`EnergyLedger::consume`], the consumption signal path of the radio
//! model. Nothing in the simulation core decrements energy directly.

use std::collections::BTreeMap;
use std::time::Duration;

use log::warn;

use crate::config::ValidationError;
use crate::error::{SimError, SimResult};
use crate::topology::NodeId;

/// Notification published by the ledger
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnergyNotice {
    /// The node's remaining energy reached zero
    Depleted { node: NodeId, at: Duration },
}

/// Read cursor into the ledger's notice log
#[derive(Debug, Clone, Default)]
pub struct Subscription {
    cursor: usize,
}

#[derive(Debug, Clone, Copy)]
struct Budget {
    initial: f64,
    remaining: f64,
}

/// Remaining energy of every node
#[derive(Debug, Clone, Default)]
pub struct EnergyLedger {
    budgets: BTreeMap<NodeId, Budget>,
    notices: Vec<EnergyNotice>,
}

impl EnergyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the starting budget of `node`. Allowed once per node.
    ///
    /// Negative or non-finite budgets are configuration errors.
    pub fn initialize(&mut self, node: NodeId, joules: f64) -> SimResult<()> {
        if self.budgets.contains_key(&node) {
            return Err(SimError::AlreadyInitialized(node));
        }
        if !joules.is_finite() || joules < 0.0 {
            return Err(ValidationError::InvalidEnergy(format!(
                "initial budget of node {} must be a finite non-negative number, got {}",
                node, joules
            ))
            .into());
        }
        self.budgets.insert(
            node,
            Budget {
                initial: joules,
                remaining: joules,
            },
        );
        Ok(())
    }

    /// Remaining energy of `node` in joules, never negative
    pub fn remaining(&self, node: NodeId) -> SimResult<f64> {
        self.budget(node).map(|budget| budget.remaining)
    }

    /// Budget `node` started with
    pub fn initial(&self, node: NodeId) -> SimResult<f64> {
        self.budget(node).map(|budget| budget.initial)
    }

    pub fn is_depleted(&self, node: NodeId) -> SimResult<bool> {
        self.remaining(node).map(|joules| joules <= 0.0)
    }

    /// Ids of all initialized nodes in ascending order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.budgets.keys().copied()
    }

    /// Apply an external consumption signal.
    ///
    /// Remaining energy is clamped at zero. The first time a node reaches zero
    /// a [`EnergyNotice::Depleted`] is published. Returns the new remaining energy.
    pub fn consume(&mut self, node: NodeId, joules: f64, at: Duration) -> SimResult<f64> {
        let budget = self
            .budgets
            .get_mut(&node)
            .ok_or(SimError::UnknownEntity(node))?;
        if budget.remaining <= 0.0 || joules <= 0.0 {
            return Ok(budget.remaining);
        }

        budget.remaining = (budget.remaining - joules).max(0.0);
        if budget.remaining <= 0.0 {
            warn!("Node {} depleted its energy at {:.3}s", node, at.as_secs_f64());
            self.notices.push(EnergyNotice::Depleted { node, at });
        }
        Ok(budget.remaining)
    }

    /// Start receiving notices published from now on
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            cursor: self.notices.len(),
        }
    }

    /// Notices published since the subscription last polled
    pub fn poll(&self, subscription: &mut Subscription) -> &[EnergyNotice] {
        let start = subscription.cursor.min(self.notices.len());
        subscription.cursor = self.notices.len();
        &self.notices[start..]
    }

    fn budget(&self, node: NodeId) -> SimResult<&Budget> {
        self.budgets.get(&node).ok_or(SimError::UnknownEntity(node))
    }
}
