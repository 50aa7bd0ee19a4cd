//! Shared utilities: configuration validation helpers.

pub mod validation;

pub use validation::{validate_roles, validate_session_timing, validate_topology_shape};
