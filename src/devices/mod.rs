//! PCS-side device models: storage, production, consumption.

/// Battery storage model with rate, efficiency and boundary handling.
pub mod battery;
/// Sinusoidal local load profile.
pub mod consumption;
pub mod pcs_unit;
/// Daylight-shaped on-site generation profile.
pub mod production;
pub mod types;

// Re-export the main types for convenience
pub use battery::{BatteryStatus, BatteryStorage};
pub use consumption::Consumption;
pub use pcs_unit::{PcsStep, PcsUnit};
pub use production::Production;
pub use types::EnergyProfile;
