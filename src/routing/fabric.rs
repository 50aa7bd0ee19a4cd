//! Routing collaborator interface and the AODV-like stand-in resolver.
//!
//! The simulation core never computes routes itself. At setup it hands the
//! collaborator every node's role plus the private attacker link list, then
//! asks it for a path whenever the source dispatches a packet.
//!
//! [`FreshestRouteResolver`] mimics how AODV picks between competing route
//! replies: a reply with a newer destination sequence number wins over a
//! shorter one. Sinkholes answer every route request with an inflated
//! sequence number, so as soon as one of them can hear the request its reply
//! is preferred over the honest one.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use log::{debug, info};

use crate::topology::{NeighborTable, NodeId, NodeRole, Topology};

/// Path chosen for a flow, from source to destination inclusive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub hops: Vec<NodeId>,
    /// Attacker whose fraudulent advertisement attracted the route, if any
    pub attracted_by: Option<NodeId>,
}

impl Route {
    /// Number of links traversed
    pub fn hop_count(&self) -> usize {
        self.hops.len().saturating_sub(1)
    }
}

/// External routing protocol as seen by the simulation core
pub trait RoutingCollaborator {
    /// Receive roles and the private attacker links. Called once at setup.
    fn configure(&mut self, topology: &Topology, attacker_links: &[(NodeId, NodeId)]);

    /// Path currently used from `from` to `to`, `None` when unreachable
    fn route(&mut self, from: NodeId, to: NodeId) -> Option<Route>;

    /// Stop using `node`, e.g. after it ran out of energy
    fn invalidate(&mut self, node: NodeId);
}

/// Freshness-first route selection over the radio neighbour graph
#[derive(Debug, Clone, Default)]
pub struct FreshestRouteResolver {
    radio_range_m: f64,
    neighbors: NeighborTable,
    roles: BTreeMap<NodeId, NodeRole>,
    /// Attacker id -> id of the lowest attacker it shares a private link group with
    attacker_groups: BTreeMap<NodeId, NodeId>,
    unavailable: BTreeSet<NodeId>,
    cache: BTreeMap<(NodeId, NodeId), Option<Route>>,
}

impl FreshestRouteResolver {
    pub fn new(radio_range_m: f64) -> Self {
        Self {
            radio_range_m,
            ..Self::default()
        }
    }

    /// Attacker groups formed by the private links, keyed by their lowest member
    pub fn attacker_groups(&self) -> BTreeMap<NodeId, Vec<NodeId>> {
        let mut groups: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
        for (&attacker, &group) in &self.attacker_groups {
            groups.entry(group).or_default().push(attacker);
        }
        groups
    }

    /// Fewest-hop radio path, ties broken towards lower node ids
    fn shortest_path(&self, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
        if self.unavailable.contains(&from) || self.unavailable.contains(&to) {
            return None;
        }
        if from == to {
            return Some(vec![from]);
        }

        let mut parent: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        let mut visited = BTreeSet::from([from]);
        let mut queue = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            for &next in self.neighbors.of(current) {
                if self.unavailable.contains(&next) || !visited.insert(next) {
                    continue;
                }
                parent.insert(next, current);
                if next == to {
                    let mut path = vec![to];
                    let mut cursor = to;
                    while let Some(&previous) = parent.get(&cursor) {
                        path.push(previous);
                        cursor = previous;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }
        None
    }

    /// Nearest attacker that hears a route request flooded from `from`.
    ///
    /// Every member of a linked group answers for the whole group, so the
    /// request is captured by whichever member is reached first.
    fn capturing_attacker(&self, from: NodeId) -> Option<(NodeId, Vec<NodeId>)> {
        self.attacker_groups
            .keys()
            .filter(|attacker| !self.unavailable.contains(attacker))
            .filter_map(|&attacker| self.shortest_path(from, attacker).map(|path| (attacker, path)))
            .min_by_key(|(attacker, path)| (path.len(), *attacker))
    }

    fn resolve(&self, from: NodeId, to: NodeId) -> Option<Route> {
        if let Some((attacker, mut hops)) = self.capturing_attacker(from) {
            // The attacker claims the destination; anything it lets through
            // continues on the honest path from there.
            if let Some(onward) = self.shortest_path(attacker, to) {
                hops.extend(onward.into_iter().skip(1));
            }
            return Some(Route {
                hops,
                attracted_by: Some(attacker),
            });
        }

        self.shortest_path(from, to).map(|hops| Route {
            hops,
            attracted_by: None,
        })
    }
}

impl RoutingCollaborator for FreshestRouteResolver {
    fn configure(&mut self, topology: &Topology, attacker_links: &[(NodeId, NodeId)]) {
        self.neighbors = NeighborTable::within_range(topology, self.radio_range_m);
        self.roles = topology.nodes().map(|node| (node.id, node.role)).collect();
        self.unavailable.clear();
        self.cache.clear();

        // Union attackers along the private links; each group is keyed by its lowest id
        self.attacker_groups = topology.attackers().iter().map(|&a| (a, a)).collect();
        let mut changed = true;
        while changed {
            changed = false;
            for &(a, b) in attacker_links {
                let (Some(&group_a), Some(&group_b)) = (self.attacker_groups.get(&a), self.attacker_groups.get(&b)) else {
                    continue;
                };
                let lowest = group_a.min(group_b);
                for member in [a, b] {
                    if self.attacker_groups[&member] != lowest {
                        self.attacker_groups.insert(member, lowest);
                        changed = true;
                    }
                }
            }
        }

        info!(
            "Routing configured: {} nodes, {} attacker group(s), {} private link(s)",
            self.roles.len(),
            self.attacker_groups().len(),
            attacker_links.len()
        );
    }

    fn route(&mut self, from: NodeId, to: NodeId) -> Option<Route> {
        if let Some(cached) = self.cache.get(&(from, to)) {
            return cached.clone();
        }
        let route = self.resolve(from, to);
        match &route {
            Some(route) => debug!(
                "Route {} -> {} over {:?} (attracted by {:?})",
                from, to, route.hops, route.attracted_by
            ),
            None => debug!("No route {} -> {}", from, to),
        }
        self.cache.insert((from, to), route.clone());
        route
    }

    fn invalidate(&mut self, node: NodeId) {
        if self.unavailable.insert(node) {
            debug!("Node {} removed from routing", node);
            self.cache.clear();
        }
    }
}
