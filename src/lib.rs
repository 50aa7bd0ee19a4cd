//! # Sinkholesim - Discrete-event simulation of a wireless sinkhole attack
//!
//! This library simulates a multi-hop ad-hoc wireless network in which a
//! few nodes falsely advertise themselves as the best route to every
//! destination, attract the traffic of an OnOff data flow and drop it.
//!
//! ## Overview
//!
//! A single-threaded event clock drives four concerns:
//!
//! - **Energy**: every node starts with a fixed budget that the radio model
//!   drains on transmit, receive and idle listening
//! - **Telemetry**: remaining energy of every node is sampled periodically
//!   and written to a CSV file
//! - **Traffic**: an OnOff session sends fixed-size packets from the source
//!   to the sink and counts what arrives
//! - **Visualisation**: node colours follow roles and transmissions
//!
//! ## Architecture
//!
//! - `clock`: discrete-event scheduler with one-shot and periodic timers
//! - `config`: type-safe configuration structures and YAML parsing
//! - `config_loader`: configuration file loading and CLI overrides
//! - `topology`: node roles, grid placement, radio neighbours
//! - `energy`: energy ledger and radio energy model
//! - `routing`: routing collaborator, AODV-like resolver, forwarding policy
//! - `traffic`: OnOff session and hop-by-hop transport
//! - `telemetry`: periodic energy recorder and its sinks
//! - `visual`: transmission highlighting and visualizer backends
//! - `world`: mutable state shared by scheduled callbacks
//! - `orchestrator`: wiring and execution of a run
//! - `report`: run reports and baseline comparison
//! - `utils`: validation helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use sinkholesim::{config_loader, orchestrator::{RunOutputs, SimulationOrchestrator}};
//!
//! let config = config_loader::load_config(Path::new("sinkhole.yaml"))?;
//! let report = SimulationOrchestrator::new(config)?.run(&RunOutputs::csv("energy_log.csv"))?;
//! println!("{}", sinkholesim::report::format_summary(&report));
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Configuration Format
//!
//! Every section and field is optional; omitted values reproduce the
//! reference scenario (22 nodes, attackers 2 and 7, flow 20 -> 21, 50 s).
//!
//! ```yaml
//! general:
//!   seed: 42
//!   horizon: "50s"
//! roles:
//!   attackers: [2, 7]
//!   source: 20
//!   sink: 21
//! traffic:
//!   packet_size: 1024
//!   start: "2s"
//!   stop: "50s"
//! attack:
//!   suppression: drop_all
//! ```
//!
//! ## Error Handling
//!
//! Simulation failures are [`SimError`] values; the binary and the loading
//! helpers add context with `color_eyre`. Lost or sunk packets are never
//! errors, they only show up in the delivery counters.

pub mod clock;
pub mod config;
pub mod config_loader;
pub mod energy;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod routing;
pub mod telemetry;
pub mod topology;
pub mod traffic;
pub mod utils;
pub mod visual;
pub mod world;

pub use error::{SimError, SimResult};
