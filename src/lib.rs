//! ISO/PCS electricity market simulator.
//!
//! An Independent System Operator sets buy/sell prices and dispatch; one or
//! more Power Consumption & Storage units respond by charging or
//! discharging their batteries. The [`sim`] controllers expose the
//! per-step transition through a reset/step contract.

pub mod cli;
/// TOML scenario configuration and presets.
pub mod config;
pub mod devices;
pub mod error;
pub mod forecast;
/// CSV export of step records.
pub mod io;
/// Pricing strategies, demand and grid costs.
pub mod market;
pub mod reward;
pub mod runner;
/// Controllers, PCS aggregation, metrics and scheduling.
pub mod sim;

pub use error::{Result, SimError};
