//! Routing fabric: the collaborator interface, its AODV-like stand-in and the
//! explicit forwarding policy that makes attacker nodes swallow data.

pub mod fabric;
pub mod policy;

pub use fabric::{FreshestRouteResolver, Route, RoutingCollaborator};
pub use policy::{ForwardDecision, ForwardingPolicy};
