//! Node energy: the ledger of remaining joules and the radio model that
//! drains it.

pub mod ledger;
pub mod radio;

pub use ledger::{EnergyLedger, EnergyNotice, Subscription};
pub use radio::RadioEnergyModel;
