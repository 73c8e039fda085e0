/// Episode step counter and time-of-day tracking.
pub mod clock;
pub(crate) mod episode;
pub mod iso_controller;
pub mod kpi;
/// Per-episode history tracking.
pub mod metrics;
pub mod pcs_controller;
pub mod pcs_simulator;
/// Fixed PCS and ISO response policies.
pub mod policy;
pub mod power_balance;
/// Day-ahead bid construction.
pub mod schedule;
pub mod types;

pub use iso_controller::IsoController;
pub use pcs_controller::PcsController;
pub use types::{Environment, PcsAction, ResetOptions, StepInfo, Transition};
