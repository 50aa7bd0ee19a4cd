//! Forwarding policy for application data.
//!
//! Whether a node passes a data packet on is decided here, explicitly, for
//! every hop. Honest nodes always forward. Attacker nodes apply the
//! configured [`SuppressionPolicy`]; with the default `DropAll` they forward
//! nothing, which is what turns attracted traffic into silent loss.

use rand::Rng;

use crate::config::SuppressionPolicy;
use crate::topology::NodeRole;

/// Outcome of the forwarding check at one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardDecision {
    Forward,
    /// The packet is swallowed by a sinkhole
    Sink,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForwardingPolicy {
    suppression: SuppressionPolicy,
}

impl ForwardingPolicy {
    pub fn new(suppression: SuppressionPolicy) -> Self {
        Self { suppression }
    }

    pub fn suppression(&self) -> SuppressionPolicy {
        self.suppression
    }

    /// Decide whether a node with `role` forwards a data packet it received.
    ///
    /// `rng` is only drawn from for attackers under a probabilistic policy, so
    /// runs without attackers consume exactly the same random stream.
    pub fn decide<R: Rng + ?Sized>(&self, role: NodeRole, rng: &mut R) -> ForwardDecision {
        if role != NodeRole::Attacker {
            return ForwardDecision::Forward;
        }
        match self.suppression {
            SuppressionPolicy::DropAll => ForwardDecision::Sink,
            SuppressionPolicy::Probabilistic { drop_probability } => {
                if rng.gen_bool(drop_probability.clamp(0.0, 1.0)) {
                    ForwardDecision::Sink
                } else {
                    ForwardDecision::Forward
                }
            }
        }
    }
}
