//! Application traffic: the OnOff session and the transport that carries
//! its packets.

pub mod session;
pub mod transport;

pub use session::{Direction, PacketId, SessionWindow, TrafficEvent, TrafficSession};
pub use transport::{DeliveryStats, Transport};
