//! Transmission highlighting.
//!
//! A trigger paints the sender yellow and the receiver orange for a fixed
//! duration, after which each node goes back to neutral green. Triggers may
//! overlap on the same node; the latest one wins and reversions issued by
//! older triggers are ignored.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{SimError, SimResult};
use crate::topology::{NodeId, NodeRole};
use crate::visual::visualizer::Rgb;

pub const SENDER: Rgb = Rgb::new(255, 255, 0);
pub const RECEIVER: Rgb = Rgb::new(255, 165, 0);
pub const NEUTRAL: Rgb = Rgb::new(0, 255, 0);
pub const ATTACKER: Rgb = Rgb::new(255, 0, 0);
pub const SOURCE: Rgb = Rgb::new(0, 0, 255);

/// Colour a node shows before any highlight
pub fn role_color(role: NodeRole) -> Rgb {
    match role {
        NodeRole::Attacker => ATTACKER,
        NodeRole::TrafficSource => SOURCE,
        NodeRole::Regular | NodeRole::TrafficSink => NEUTRAL,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightState {
    Idle,
    Highlighted { color: Rgb, until: Duration, generation: u64 },
}

/// A colour to apply now, for `duration`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightEvent {
    pub at: Duration,
    pub node: NodeId,
    pub color: Rgb,
    pub duration: Duration,
}

/// Token to hand back to [`AttackHighlighter::revert`] when the highlight expires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reversion {
    pub node: NodeId,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct AttackHighlighter {
    duration: Duration,
    states: BTreeMap<NodeId, HighlightState>,
    generations: BTreeMap<NodeId, u64>,
}

impl AttackHighlighter {
    pub fn new(ids: impl IntoIterator<Item = NodeId>, duration: Duration) -> Self {
        let states = ids.into_iter().map(|id| (id, HighlightState::Idle)).collect();
        Self {
            duration,
            states,
            generations: BTreeMap::new(),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn state(&self, node: NodeId) -> SimResult<HighlightState> {
        self.states.get(&node).copied().ok_or(SimError::UnknownEntity(node))
    }

    /// Highlight a transmission from `from` to `to` at `now`.
    ///
    /// Both ids are checked before any state changes. The returned
    /// reversions are due at `now + duration`.
    pub fn trigger(&mut self, now: Duration, from: NodeId, to: NodeId) -> SimResult<[(HighlightEvent, Reversion); 2]> {
        for node in [from, to] {
            if !self.states.contains_key(&node) {
                return Err(SimError::UnknownEntity(node));
            }
        }
        Ok([self.paint(now, from, SENDER), self.paint(now, to, RECEIVER)])
    }

    fn paint(&mut self, now: Duration, node: NodeId, color: Rgb) -> (HighlightEvent, Reversion) {
        let generation = self.generations.entry(node).or_insert(0);
        *generation += 1;
        let generation = *generation;

        let until = now + self.duration;
        self.states
            .insert(node, HighlightState::Highlighted { color, until, generation });

        (
            HighlightEvent {
                at: now,
                node,
                color,
                duration: self.duration,
            },
            Reversion { node, generation },
        )
    }

    /// Expire a highlight. Returns the node to repaint neutral, or `None`
    /// when a newer trigger has taken over the node since.
    pub fn revert(&mut self, reversion: Reversion) -> Option<NodeId> {
        match self.states.get(&reversion.node) {
            Some(HighlightState::Highlighted { generation, .. }) if *generation == reversion.generation => {
                self.states.insert(reversion.node, HighlightState::Idle);
                Some(reversion.node)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlighter() -> AttackHighlighter {
        AttackHighlighter::new(0..22, Duration::from_secs(1))
    }

    #[test]
    fn test_trigger_colors_sender_and_receiver() {
        let mut h = highlighter();
        let [(sent, _), (received, _)] = h.trigger(Duration::from_secs(2), 20, 21).unwrap();

        assert_eq!(sent.duration, h.duration());
        assert_eq!(sent.node, 20);
        assert_eq!(sent.color, SENDER);
        assert_eq!(received.node, 21);
        assert_eq!(received.color, RECEIVER);
        assert_eq!(
            h.state(21).unwrap(),
            HighlightState::Highlighted {
                color: RECEIVER,
                until: Duration::from_secs(3),
                generation: 1
            }
        );
    }

    #[test]
    fn test_reversion_returns_node_to_idle() {
        let mut h = highlighter();
        let [(_, back_sender), (_, back_receiver)] = h.trigger(Duration::ZERO, 1, 2).unwrap();

        assert_eq!(h.revert(back_sender), Some(1));
        assert_eq!(h.revert(back_receiver), Some(2));
        assert_eq!(h.state(1).unwrap(), HighlightState::Idle);
        // A second reversion of the same trigger is a no-op
        assert_eq!(h.revert(back_sender), None);
    }

    #[test]
    fn test_latest_highlight_wins() {
        let mut h = highlighter();
        let [(_, first), _] = h.trigger(Duration::from_millis(0), 5, 6).unwrap();
        let [(_, second), _] = h.trigger(Duration::from_millis(500), 5, 7).unwrap();

        assert_eq!(h.revert(first), None);
        assert!(matches!(h.state(5).unwrap(), HighlightState::Highlighted { generation: 2, .. }));
        assert_eq!(h.revert(second), Some(5));
    }

    #[test]
    fn test_unknown_node_leaves_state_untouched() {
        let mut h = highlighter();
        assert!(matches!(
            h.trigger(Duration::ZERO, 3, 99),
            Err(SimError::UnknownEntity(99))
        ));
        assert_eq!(h.state(3).unwrap(), HighlightState::Idle);
    }

    #[test]
    fn test_role_colors() {
        assert_eq!(role_color(NodeRole::Attacker), ATTACKER);
        assert_eq!(role_color(NodeRole::TrafficSource), SOURCE);
        assert_eq!(role_color(NodeRole::TrafficSink), NEUTRAL);
    }
}
